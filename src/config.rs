// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/flickow/config.toml 读取配置

use crate::filter::FilterRules;
use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::env; // 环境变量模块
use std::fs; // 文件系统模块
use std::path::{Path, PathBuf}; // 路径处理类型

/// 展开路径中的 ~ 和环境变量 ($HOME, $XDG_CONFIG_HOME 等)
/// 支持格式: ~/path, $HOME/path, ${HOME}/path
fn expand_path(path_str: &str) -> PathBuf {
    // shellexpand::tilde 会展开 ~ 和 $HOME 等环境变量
    let expanded = tilde(path_str).into_owned();
    PathBuf::from(expanded)
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
    #[serde(default)]
    source: SourceConfigs,
    #[serde(default)]
    feh: FehConfig,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct CommonConfig {
    /// 照片保存目录 (支持 ~、$HOME 等环境变量，相对路径则相对于 $HOME)
    download_dir: Option<String>,
    /// 壁纸设置方式 (wallpaper / feh)，默认 wallpaper
    #[serde(default = "default_setter")]
    setter: String,
    /// 默认下载参数
    #[serde(default)]
    fetch: FetchDefaults,
    /// 默认筛选规则
    #[serde(default)]
    filter: FilterDefaults,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            setter: default_setter(),
            fetch: FetchDefaults::default(),
            filter: FilterDefaults::default(),
        }
    }
}

/// 默认下载参数
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FetchDefaults {
    /// 下载数量
    #[serde(default = "default_count")]
    pub count: usize,
    /// 并发宽度（同时处理的照片数，1 为串行）
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// 榜单每页候选数量（Flickr 上限 500）
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// 是否在下载前打乱候选顺序
    #[serde(default)]
    pub shuffle: bool,
}

impl Default for FetchDefaults {
    fn default() -> Self {
        Self {
            count: default_count(),
            jobs: default_jobs(),
            per_page: default_per_page(),
            shuffle: false,
        }
    }
}

/// 默认筛选规则
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FilterDefaults {
    /// 最小宽度（像素，严格大于）
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    /// 最小高度（像素，严格大于）
    #[serde(default = "default_min_height")]
    pub min_height: u32,
    /// 宽高比下限
    #[serde(default = "default_ratio_min")]
    pub ratio_min: f64,
    /// 宽高比上限
    #[serde(default = "default_ratio_max")]
    pub ratio_max: f64,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            min_width: default_min_width(),
            min_height: default_min_height(),
            ratio_min: default_ratio_min(),
            ratio_max: default_ratio_max(),
        }
    }
}

impl FilterDefaults {
    /// 转换为筛选模块使用的规则结构
    pub fn rules(&self) -> FilterRules {
        FilterRules {
            min_width: self.min_width,
            min_height: self.min_height,
            ratio_min: self.ratio_min,
            ratio_max: self.ratio_max,
        }
    }
}

fn default_count() -> usize {
    1
}
fn default_jobs() -> usize {
    4
}
fn default_per_page() -> u32 {
    100
}
fn default_min_width() -> u32 {
    1600
}
fn default_min_height() -> u32 {
    1200
}
fn default_ratio_min() -> f64 {
    1.3
}
fn default_ratio_max() -> f64 {
    1.4
}
fn default_setter() -> String {
    "wallpaper".to_string()
}
fn default_feh_mode() -> String {
    "scale".to_string()
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct SourceConfigs {
    #[serde(default)]
    flickr: FlickrConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct FlickrConfig {
    api_key: Option<String>,
}

/// feh 集成配置
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct FehConfig {
    /// feh 的铺排方式 (scale / fill / center / tile / max)
    #[serde(default = "default_feh_mode")]
    mode: String,
}

impl Default for FehConfig {
    fn default() -> Self {
        Self {
            mode: default_feh_mode(),
        }
    }
}

/// 应用全局配置项
pub struct AppConfig {
    /// Flickr API Key (优先级：ENV > TOML)
    pub api_key: Option<String>,
    /// 壁纸设置方式 (wallpaper / feh)
    pub setter: String,
    /// 照片保存目录
    pub download_dir: PathBuf,
    /// 配置文件所在路径
    pub config_path: PathBuf,
    /// 默认下载参数
    pub fetch_defaults: FetchDefaults,
    /// 默认筛选规则
    pub filter_defaults: FilterDefaults,
    /// feh 铺排方式
    pub feh_mode: String,
}

impl AppConfig {
    /// 初始化配置
    pub fn new() -> Self {
        let home = env::var("HOME").expect("无法获取 $HOME 环境变量");
        let home_path = PathBuf::from(&home);
        let config_dir = home_path.join(".config").join("flickow");
        let config_path = config_dir.join("config.toml");

        let config_file = Self::load_config_from_file(&config_path).unwrap_or_default();

        // 优先级：环境变量 > 配置文件内容
        let api_key = env::var("FLICKR_API_KEY")
            .ok()
            .or(config_file.source.flickr.api_key);

        // 照片目录：
        // 1. 如果配置了路径：展开 ~ 和环境变量，然后检查是否为绝对路径
        // 2. 相对路径则相对于 $HOME
        // 3. 如果未配置：默认使用 $HOME/Pictures/flickow
        let download_dir = if let Some(dir_str) = config_file.common.download_dir {
            let p = expand_path(&dir_str); // 展开 ~ 和 $HOME 等变量
            if p.is_absolute() { p } else { home_path.join(p) }
        } else {
            home_path.join("Pictures").join("flickow")
        };

        Self {
            api_key,
            setter: config_file.common.setter,
            download_dir,
            config_path,
            fetch_defaults: config_file.common.fetch,
            filter_defaults: config_file.common.filter,
            feh_mode: config_file.feh.mode,
        }
    }

    /// 辅助函数：解析 TOML 配置文件
    fn load_config_from_file(path: &Path) -> Option<ConfigFile> {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }

    /// 确保所有必要的目录都存在
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.download_dir)
    }

    /// 由当前内存状态重建文件结构体
    fn to_config_file(&self) -> ConfigFile {
        ConfigFile {
            common: CommonConfig {
                download_dir: Some(self.download_dir.to_string_lossy().to_string()),
                setter: self.setter.clone(),
                fetch: self.fetch_defaults.clone(),
                filter: self.filter_defaults.clone(),
            },
            source: SourceConfigs {
                flickr: FlickrConfig {
                    api_key: self.api_key.clone(),
                },
            },
            feh: FehConfig {
                mode: self.feh_mode.clone(),
            },
        }
    }

    /// 将配置保存回文件
    pub fn save(&self) -> std::io::Result<()> {
        let toml_str = toml::to_string_pretty(&self.to_config_file())
            .map_err(std::io::Error::other)?;
        fs::write(&self.config_path, toml_str)
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> String {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).unwrap()
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> String {
        let toml_str = toml::to_string_pretty(&self.to_config_file())
            .unwrap_or_else(|_| "# Error serializing config".to_string());

        // 在 [source.flickr] 节前追加注释说明
        // toml 库不支持带注释序列化，所以手动插入
        toml_str.replace(
            "[source.flickr]",
            "# Flickr API Key 也可以通过环境变量 FLICKR_API_KEY 提供\n[source.flickr]\n# api_key = \"your_flickr_api_key_here\"",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_file_falls_back_to_defaults() {
        let config: ConfigFile = toml::from_str("").unwrap();

        assert_eq!(config.common.setter, "wallpaper");
        assert_eq!(config.common.fetch.count, 1);
        assert_eq!(config.common.fetch.jobs, 4);
        assert_eq!(config.common.fetch.per_page, 100);
        assert!(!config.common.fetch.shuffle);
        assert_eq!(config.common.filter.min_width, 1600);
        assert_eq!(config.common.filter.min_height, 1200);
        assert_eq!(config.common.filter.ratio_min, 1.3);
        assert_eq!(config.common.filter.ratio_max, 1.4);
        assert_eq!(config.feh.mode, "scale");
        assert!(config.source.flickr.api_key.is_none());
    }

    #[test]
    fn partial_config_keeps_untouched_defaults() {
        let config: ConfigFile = toml::from_str(
            r#"
            [common]
            setter = "feh"

            [common.fetch]
            count = 3

            [common.filter]
            ratio_min = 1.6
            ratio_max = 1.8

            [source.flickr]
            api_key = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(config.common.setter, "feh");
        assert_eq!(config.common.fetch.count, 3);
        assert_eq!(config.common.fetch.jobs, 4); // 未配置的键保持默认
        assert_eq!(config.common.filter.ratio_min, 1.6);
        assert_eq!(config.common.filter.min_width, 1600);
        assert_eq!(config.source.flickr.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn filter_defaults_map_onto_rules() {
        let defaults = FilterDefaults {
            min_width: 1920,
            min_height: 1080,
            ratio_min: 1.7,
            ratio_max: 1.8,
        };
        let rules = defaults.rules();

        assert_eq!(rules.min_width, 1920);
        assert_eq!(rules.min_height, 1080);
        assert_eq!(rules.ratio_min, 1.7);
        assert_eq!(rules.ratio_max, 1.8);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let original: ConfigFile = toml::from_str(
            r#"
            [common]
            download_dir = "~/Pictures/flickow"

            [common.fetch]
            count = 2
            shuffle = true
            "#,
        )
        .unwrap();

        let dumped = toml::to_string_pretty(&original).unwrap();
        let reparsed: ConfigFile = toml::from_str(&dumped).unwrap();

        assert_eq!(reparsed.common.fetch.count, 2);
        assert!(reparsed.common.fetch.shuffle);
        assert_eq!(
            reparsed.common.download_dir.as_deref(),
            Some("~/Pictures/flickow")
        );
    }
}
