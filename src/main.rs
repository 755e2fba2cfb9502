// main.rs — 程序入口
// 负责初始化异步运行时、解析命令行参数、分发子命令

mod cli; // 声明 cli 模块，对应 src/cli.rs
mod config; // 声明 config 模块，对应 src/config.rs
mod feh; // 声明 feh 模块，对应 src/feh.rs
mod filter;
mod setter;
mod source;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use clap::{CommandFactory, Parser}; // 引入 Parser trait 的 parse() 方法; CommandFactory 用于生成补全脚本
use clap_complete::generate; // 引入补全脚本生成函数
use cli::{Cli, Commands}; // 引入 CLI 结构体和子命令枚举
use config::AppConfig; // 引入应用配置
use filter::FilterRules;
use rand::seq::SliceRandom; // 提供切片的 shuffle() 方法
use rust_i18n::t; // 引入翻译宏
use source::flickr::FlickrClient; // 引入 Flickr API 客户端
use source::{ListOptions, PhotoSource, download_matching};
use std::path::PathBuf;

/// `#[tokio::main]` 宏将 async main 转换为同步 main + tokio 运行时
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    // 解析命令行参数
    let cli = Cli::parse();

    // 创建应用配置（读取环境变量、设置路径）
    let mut config = AppConfig::new();

    // 确保照片目录存在
    config.ensure_dirs()?;

    // 根据子命令分发执行逻辑
    match &cli.command {
        Commands::Fetch {
            count,
            date,
            per_page,
            jobs,
            min_width,
            min_height,
            ratio,
            shuffle,
            api_key,
        } => {
            handle_fetch(
                &config,
                FetchOverrides {
                    count: *count,
                    date: date.as_deref(),
                    per_page: *per_page,
                    jobs: *jobs,
                    min_width: *min_width,
                    min_height: *min_height,
                    ratio: ratio.as_deref(),
                    shuffle: *shuffle,
                    api_key: api_key.as_deref(),
                },
            )
            .await?;
        }

        Commands::Set {
            date,
            feh,
            shuffle,
            api_key,
        } => {
            handle_set(&config, date.as_deref(), *feh, *shuffle, api_key.as_deref()).await?;
        }

        Commands::Apply { image, feh } => {
            handle_apply(&config, image, *feh)?;
        }

        Commands::List => {
            handle_list(&config)?;
        }

        Commands::Clean => {
            handle_clean(&config)?;
        }

        Commands::Config { action } => {
            handle_config(&mut config, action)?;
        }

        Commands::Completions { shell } => {
            generate(
                *shell,
                &mut Cli::command(),
                "flickow",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// fetch 的命令行覆盖项，未指定的项回落到配置文件默认值
struct FetchOverrides<'a> {
    count: Option<usize>,
    date: Option<&'a str>,
    per_page: Option<u32>,
    jobs: Option<usize>,
    min_width: Option<u32>,
    min_height: Option<u32>,
    ratio: Option<&'a str>,
    shuffle: bool,
    api_key: Option<&'a str>,
}

/// 解析 API Key：命令行 > 环境变量 > 配置文件
fn resolve_api_key(
    config: &AppConfig,
    cli_key: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    cli_key
        .map(str::to_string)
        .or_else(|| config.api_key.clone())
        .ok_or_else(|| t!("error_no_api_key").into())
}

/// 合成本次运行生效的筛选规则
fn resolve_rules(
    config: &AppConfig,
    min_width: Option<u32>,
    min_height: Option<u32>,
    ratio: Option<&str>,
) -> Result<FilterRules, Box<dyn std::error::Error>> {
    let mut rules = config.filter_defaults.rules();
    if let Some(w) = min_width {
        rules.min_width = w;
    }
    if let Some(h) = min_height {
        rules.min_height = h;
    }
    if let Some(raw) = ratio {
        rules = rules.with_ratio_window(raw)?;
    }
    Ok(rules)
}

/// 处理 fetch 子命令：查询榜单、筛选并下载照片
async fn handle_fetch(
    config: &AppConfig,
    overrides: FetchOverrides<'_>,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let api_key = resolve_api_key(config, overrides.api_key)?;
    let rules = resolve_rules(
        config,
        overrides.min_width,
        overrides.min_height,
        overrides.ratio,
    )?;

    let count = overrides.count.unwrap_or(config.fetch_defaults.count);
    let jobs = overrides.jobs.unwrap_or(config.fetch_defaults.jobs);
    let per_page = overrides.per_page.unwrap_or(config.fetch_defaults.per_page);
    let shuffle = overrides.shuffle || config.fetch_defaults.shuffle;

    let client = FlickrClient::new(api_key);

    println!("{}", t!("search_start"));

    let mut photos = client
        .list_interesting(ListOptions {
            date: overrides.date,
            per_page,
            page: 1,
        })
        .await?;

    if photos.is_empty() {
        println!("{}", t!("no_photos"));
        return Ok(Vec::new());
    }

    println!("{}", t!("listing_count", count => photos.len()));

    // 榜单接口没有随机排序，按需在本地打乱候选顺序
    if shuffle {
        photos.shuffle(&mut rand::thread_rng());
    }

    let saved =
        download_matching(&client, &photos, &rules, &config.download_dir, count, jobs).await;

    if saved.is_empty() {
        println!("{}", t!("no_matching"));
    } else {
        println!("{}", t!("download_done", count => saved.len()));
    }

    Ok(saved)
}

/// 处理 set 子命令：下载一张匹配的照片并设为桌面壁纸
async fn handle_set(
    config: &AppConfig,
    date: Option<&str>,
    force_feh: bool,
    shuffle: bool,
    api_key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let saved = handle_fetch(
        config,
        FetchOverrides {
            count: Some(1),
            date,
            per_page: None,
            jobs: None,
            min_width: None,
            min_height: None,
            ratio: None,
            shuffle,
            api_key,
        },
    )
    .await?;

    let image_path = saved.first().ok_or(t!("no_matching"))?;

    println!("{}", t!("setting_wallpaper"));
    set_background(config, image_path, force_feh)?;
    println!("{}", t!("set_done"));

    Ok(())
}

/// 处理 apply 子命令：将本地图片设为桌面壁纸
fn handle_apply(
    config: &AppConfig,
    image: &str,
    force_feh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image_path = PathBuf::from(image);
    if !image_path.is_file() {
        return Err(t!("apply_missing", path => image_path.display()).into());
    }

    println!("{}", t!("setting_wallpaper"));
    set_background(config, &image_path, force_feh)?;
    println!("{}", t!("set_done"));

    Ok(())
}

/// 按配置选择壁纸设置方式：feh 或跨平台的 wallpaper 库
fn set_background(
    config: &AppConfig,
    image_path: &std::path::Path,
    force_feh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if force_feh || config.setter == "feh" {
        feh::check_installed()?;
        let mode = feh::FehMode::parse(&config.feh_mode)?;
        feh::set_bg(image_path, mode)
    } else {
        setter::set_from_path(image_path)
    }
}

/// 处理 list 子命令：列出已下载的照片
fn handle_list(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut names: Vec<String> = Vec::new();

    if config.download_dir.exists() {
        for entry in std::fs::read_dir(&config.download_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() {
                if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                    if filename.starts_with("flickow-") {
                        names.push(filename.to_string());
                    }
                }
            }
        }
    }

    if names.is_empty() {
        println!("{}", t!("list_empty"));
        return Ok(());
    }

    names.sort();
    println!(
        "{}",
        t!("list_title", count => names.len(), path => config.download_dir.display())
    );
    for name in names {
        println!("  {}", name);
    }

    Ok(())
}

/// 处理 clean 子命令：清理所有以 flickow- 开头的文件
fn handle_clean(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dir = &config.download_dir;

    let mut deleted_count = 0;

    if dir.exists() {
        println!("{}", t!("cleaning_dir", path => dir.display()));

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() {
                if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                    if filename.starts_with("flickow-") {
                        std::fs::remove_file(&path)?;
                        deleted_count += 1;
                        println!("  {} {}", t!("deleted"), filename);
                    }
                }
            }
        }
    }

    println!("{}", t!("clean_done", count => deleted_count));
    Ok(())
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(
    config: &mut AppConfig,
    action: &cli::ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        cli::ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!(
                "{}",
                t!("config_path", path => config.config_path.display())
            );
            println!(
                "{}",
                t!("config_download_dir", path => config.download_dir.display())
            );
            println!("{}", t!("config_setter", setter => config.setter));
            println!(
                "{}",
                t!(
                    "config_fetch",
                    count => config.fetch_defaults.count,
                    jobs => config.fetch_defaults.jobs,
                    per_page => config.fetch_defaults.per_page
                )
            );
            println!(
                "{}",
                t!(
                    "config_filter",
                    min_width => config.filter_defaults.min_width,
                    min_height => config.filter_defaults.min_height,
                    ratio_min => config.filter_defaults.ratio_min,
                    ratio_max => config.filter_defaults.ratio_max
                )
            );
        }
        cli::ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema());
        }
        cli::ConfigAction::Dump => {
            println!("{}", config.to_toml());
        }
        cli::ConfigAction::Set { key, value } => {
            match key.as_str() {
                "count" => config.fetch_defaults.count = value.parse()?,
                "jobs" => config.fetch_defaults.jobs = value.parse()?,
                "per_page" => config.fetch_defaults.per_page = value.parse()?,
                "min_width" => config.filter_defaults.min_width = value.parse()?,
                "min_height" => config.filter_defaults.min_height = value.parse()?,
                "ratio" => {
                    let (ratio_min, ratio_max) = filter::parse_ratio(value)?;
                    config.filter_defaults.ratio_min = ratio_min;
                    config.filter_defaults.ratio_max = ratio_max;
                }
                "download_dir" => config.download_dir = PathBuf::from(value),
                "setter" => {
                    if value != "wallpaper" && value != "feh" {
                        return Err(t!("config_error_bad_setter", value => value).into());
                    }
                    config.setter = value.clone();
                }
                _ => return Err(t!("config_error_unknown_key", key => key).into()),
            }
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}
