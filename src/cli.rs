// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义所有子命令和参数

use clap::{Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

/// Flickr 趣图下载与壁纸设置工具
///
/// 从 Flickr 的 interestingness 榜单获取照片，
/// 按尺寸和宽高比筛选后下载，可一键设为桌面壁纸。
#[derive(Parser)]
#[command(name = "flickow")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(author)] // 自动从 Cargo.toml 读取 authors 字段（如有）
#[command(about = "Flickr 趣图下载与壁纸设置工具 — 按尺寸/宽高比筛选 interestingness 榜单照片")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 从 Flickr interestingness 榜单筛选并下载照片
    ///
    /// 用法示例:
    ///   flickow fetch
    ///   flickow fetch -n 5 -j 8
    ///   flickow fetch --date 2026-08-01 --ratio 1.6:1.8
    Fetch {
        /// 下载数量（取榜单顺序中最先匹配的 N 张）
        #[arg(short = 'n', long, value_name = "N")]
        count: Option<usize>,

        /// 榜单日期 (YYYY-MM-DD)，不指定则为 Flickr 最近一期
        #[arg(short, long)]
        date: Option<String>,

        /// 每页返回的候选数量（Flickr 上限 500）
        #[arg(long, value_name = "N")]
        per_page: Option<u32>,

        /// 并发宽度：同时处理多少张照片的尺寸查询与下载，1 为串行
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        /// 最小宽度（像素，严格大于）
        #[arg(long, value_name = "PX")]
        min_width: Option<u32>,

        /// 最小高度（像素，严格大于）
        #[arg(long, value_name = "PX")]
        min_height: Option<u32>,

        /// 宽高比区间，格式 MIN:MAX（如 "1.3:1.4"）
        #[arg(long, value_name = "MIN:MAX")]
        ratio: Option<String>,

        /// 下载前打乱候选顺序（榜单接口没有随机排序，这里在本地打乱）
        #[arg(long)]
        shuffle: bool,

        /// Flickr API Key（优先级高于环境变量和配置文件）
        #[arg(short = 'k', long)]
        api_key: Option<String>,
    },

    /// 一键更换：下载一张匹配的照片并设为桌面壁纸
    ///
    /// 用法示例:
    ///   flickow set
    ///   flickow set --date 2026-08-01 --feh
    Set {
        /// 榜单日期 (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// 强制使用 feh 设置壁纸（默认遵循配置中的 setter）
        #[arg(long)]
        feh: bool,

        /// 下载前打乱候选顺序
        #[arg(long)]
        shuffle: bool,

        /// Flickr API Key（优先级高于环境变量和配置文件）
        #[arg(short = 'k', long)]
        api_key: Option<String>,
    },

    /// 将本地指定的图片设置为桌面壁纸
    ///
    /// 用法示例:
    ///   flickow apply image.jpg
    ///   flickow apply image.jpg --feh
    Apply {
        /// 图片的本地路径
        image: String,

        /// 强制使用 feh 设置壁纸
        #[arg(long)]
        feh: bool,
    },

    /// 列出已下载的照片
    ///
    /// 用法示例:
    ///   flickow list
    List,

    /// 清理所有带有 flickow- 前缀的下载文件
    ///
    /// 用法示例:
    ///   flickow clean
    Clean,

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   flickow config show
    ///   flickow config dump
    ///   flickow config set count 3
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   flickow completions zsh > ~/.zsh/completions/_flickow
    ///   flickow completions fish > ~/.config/fish/completions/flickow.fish
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前所有配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置配置项的值 (支持: count, jobs, per_page, min_width, min_height, ratio, download_dir, setter)
    Set {
        /// 要设置的键
        key: String,
        /// 要设置的值
        value: String,
    },
}
