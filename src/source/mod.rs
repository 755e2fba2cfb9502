// source/mod.rs — 照片源抽象与下载流水线模块
// 定义照片源必须实现的通用 Trait，以及带并发上限的筛选下载流程

pub mod flickr;

use crate::filter::{FilterRules, Verdict};
use async_trait::async_trait; // 异步 Trait 支持宏
use futures::StreamExt; // 流组合子，提供 buffered() / next()
use rust_i18n::t;
use std::path::{Path, PathBuf};

/// 统一的照片元数据结构
/// 榜单接口只提供基本信息，尺寸数据需要逐张再查询
#[derive(Debug, Clone)]
pub struct PhotoInfo {
    /// 照片在原站的 ID
    pub id: String,
    /// 照片标题（可能为空字符串）
    #[allow(dead_code)]
    pub title: String,
}

/// 榜单查询参数
pub struct ListOptions<'a> {
    /// 榜单日期 (YYYY-MM-DD)，None 表示最近一期
    pub date: Option<&'a str>,
    /// 每页候选数量
    pub per_page: u32,
    /// 页码，从 1 开始
    pub page: u32,
}

/// 单张照片处理后的结果
///
/// 一张照片可能因为版权不可下载、所有尺寸都不满足规则而被跳过，
/// 这些都不是错误，上层据此打印对应的提示后继续处理下一张。
#[derive(Debug)]
pub enum FetchOutcome {
    /// 下载成功，附带保存路径
    Saved(PathBuf),
    /// 作者禁止下载
    NotDownloadable,
    /// 没有任何尺寸通过规则，附带最接近的失败原因
    NoMatch(Verdict),
}

/// 照片源的抽象 Trait
///
/// # 异步 Trait 说明
/// Rust 原生目前对 Trait 中的 async fn 支持有限，
/// 这里使用 `async_trait` 宏来支持异步接口。
#[async_trait]
pub trait PhotoSource {
    /// 查询候选照片榜单
    /// 返回统一的 PhotoInfo 列表
    async fn list_interesting(
        &self,
        options: ListOptions<'_>,
    ) -> Result<Vec<PhotoInfo>, Box<dyn std::error::Error>>;

    /// 处理单张照片：查询尺寸列表、按规则筛选、命中则下载
    /// 返回处理结果；网络或 IO 失败才返回 Err
    async fn fetch_photo(
        &self,
        photo: &PhotoInfo,
        rules: &FilterRules,
        save_dir: &Path,
    ) -> Result<FetchOutcome, Box<dyn std::error::Error>>;
}

/// 带并发上限地处理候选列表，收集最先匹配的 count 张照片
///
/// 每张照片独立走「查尺寸 -> 筛选 -> 下载」一条链，互相之间没有共享状态；
/// `buffered(jobs)` 限制同时在途的照片数量，并保持榜单顺序产出结果，
/// 所以「最先匹配」是确定性的榜单顺序而非完成顺序。
/// 凑够 count 张后停止拉取，仍在途的照片任务随流一起丢弃。
/// 单张照片出错只打印提示并跳过，不会中断整批处理。
pub async fn download_matching<S>(
    source: &S,
    photos: &[PhotoInfo],
    rules: &FilterRules,
    save_dir: &Path,
    count: usize,
    jobs: usize,
) -> Vec<PathBuf>
where
    S: PhotoSource + Sync,
{
    let mut saved = Vec::new();
    if count == 0 || photos.is_empty() {
        return saved;
    }

    // jobs = 1 时退化为严格串行：一张处理完才开始下一张
    let mut results = futures::stream::iter(
        photos
            .iter()
            .map(|photo| async move { (photo, source.fetch_photo(photo, rules, save_dir).await) }),
    )
    .buffered(jobs.max(1));

    while let Some((photo, result)) = results.next().await {
        match result {
            Ok(FetchOutcome::Saved(path)) => {
                println!("{}", t!("save_path", path => path.display()));
                saved.push(path);
                if saved.len() >= count {
                    break;
                }
            }
            Ok(FetchOutcome::NotDownloadable) => {
                println!("{}", t!("not_downloadable", id => photo.id));
            }
            Ok(FetchOutcome::NoMatch(Verdict::TooSmall)) => {
                println!("{}", t!("wrong_size", id => photo.id));
            }
            Ok(FetchOutcome::NoMatch(_)) => {
                println!("{}", t!("wrong_ratio", id => photo.id));
            }
            Err(e) => {
                eprintln!("{}", t!("photo_failed", id => photo.id, reason => e));
            }
        }
    }

    saved
}
