// flickr.rs — Flickr REST API 异步客户端模块
// 负责与 Flickr API 交互：查询 interestingness 榜单、查询尺寸列表、下载图片
//
// 注意：Flickr REST 接口的所有方法共用同一个 endpoint，
// 通过 method 查询参数区分；出错时返回 stat = "fail" 的 JSON 信封而非 HTTP 错误码。

use super::{FetchOutcome, ListOptions, PhotoInfo, PhotoSource};
use crate::filter::{FilterRules, Verdict};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer}; // 反序列化 trait，用于将 JSON 转为 Rust 结构体
use std::path::{Path, PathBuf};
use tokio::fs::File; // tokio 提供的异步文件操作
use tokio::io::AsyncWriteExt; // 异步写入 trait，提供 write_all() 等方法

/// Flickr REST 接口的统一入口
const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

/// flickr.interestingness.getList 响应的顶层结构
///
/// # serde 说明
/// - 正常响应带 photos 字段且 stat = "ok"
/// - 失败响应没有 photos，只有 stat = "fail" 加 code / message
///   所以 photos 必须是 Option，三个错误字段也是
#[derive(Deserialize, Debug)]
struct ListResponse {
    photos: Option<PhotoPage>,
    stat: String,
    code: Option<u32>,
    message: Option<String>,
}

/// 榜单的一页
/// JSON 中还有 page / pages / total 等分页字段，用不到的会被 serde 自动忽略
#[derive(Deserialize, Debug)]
struct PhotoPage {
    photo: Vec<ListedPhoto>,
}

/// 榜单里的一条照片记录
#[derive(Deserialize, Debug)]
struct ListedPhoto {
    /// 照片唯一标识符（如 "53982170536"）
    id: String,

    /// 照片标题，老照片可能没有
    #[serde(default)]
    title: String,
}

/// flickr.photos.getSizes 响应的顶层结构
#[derive(Deserialize, Debug)]
struct SizesResponse {
    sizes: Option<SizeList>,
    stat: String,
    code: Option<u32>,
    message: Option<String>,
}

/// 单张照片的全部可用尺寸
#[derive(Deserialize, Debug)]
struct SizeList {
    /// 作者是否允许下载（JSON 里是 0/1 标志）
    #[serde(deserialize_with = "de_flag")]
    candownload: bool,

    /// 尺寸列表，Flickr 按从小到大的顺序返回
    size: Vec<PhotoSize>,
}

/// 一个具体尺寸
#[derive(Deserialize, Debug)]
struct PhotoSize {
    /// 宽度（像素）
    #[serde(deserialize_with = "de_dimension")]
    width: u32,

    /// 高度（像素）
    #[serde(deserialize_with = "de_dimension")]
    height: u32,

    /// 该尺寸图片文件的直接下载 URL
    source: String,
}

/// 反序列化 Flickr 的尺寸字段
///
/// 历史接口把 width/height 作为字符串返回（如 "1600"），
/// 新接口返回数字，两种都要能解析
fn de_dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct DimensionVisitor;

    impl serde::de::Visitor<'_> for DimensionVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer or a string holding an integer")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u32, E> {
            v.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(DimensionVisitor)
}

/// 反序列化 Flickr 的 0/1 标志位（candownload 等）
/// 数字、字符串、布尔三种形式都出现过
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl serde::de::Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a 0/1 flag as integer, string or bool")
        }

        fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<bool, E> {
            v.parse::<i64>().map(|n| n != 0).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// 把 stat = "fail" 的响应信封转换为错误
fn api_error(
    api_method: &str,
    code: Option<u32>,
    message: Option<String>,
) -> Box<dyn std::error::Error> {
    format!(
        "{} failed: code {}: {}",
        api_method,
        code.unwrap_or(0),
        message.unwrap_or_else(|| "unknown error".to_string())
    )
    .into()
}

/// Flickr API 异步客户端
///
/// 封装了 reqwest::Client 和 API 配置，提供榜单查询和逐张下载方法。
///
/// # Rust 特性说明
/// - `reqwest::Client` 内部维护连接池，应该复用而非每次请求都创建新的
pub struct FlickrClient {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,

    /// REST 接口入口 URL
    endpoint: String,

    /// Flickr API Key（所有请求都必须携带）
    api_key: String,
}

impl FlickrClient {
    /// 创建新的 Flickr 客户端
    ///
    /// # 参数
    /// - `api_key`: Flickr 开发者后台申请的 API Key
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT.to_string())
    }

    fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// 所有 Flickr REST 调用共用的基础参数
    /// nojsoncallback=1 让接口返回纯 JSON 而非 JSONP 包装
    fn base_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("nojsoncallback", "1".to_string()),
        ]
    }

    /// 查询单张照片的全部可用尺寸 (flickr.photos.getSizes)
    async fn get_sizes(&self, photo_id: &str) -> Result<SizeList, Box<dyn std::error::Error>> {
        let mut params = self.base_params();
        params.push(("method", "flickr.photos.getSizes".to_string()));
        params.push(("photo_id", photo_id.to_string()));

        let response = self.client.get(&self.endpoint).query(&params).send().await?;
        let sizes_response: SizesResponse = response.json().await?;

        if sizes_response.stat != "ok" {
            return Err(api_error(
                "flickr.photos.getSizes",
                sizes_response.code,
                sizes_response.message,
            ));
        }

        sizes_response
            .sizes
            .ok_or_else(|| "flickr.photos.getSizes returned no sizes".into())
    }

    /// 下载一个尺寸的图片文件到指定目录
    ///
    /// 文件名取 URL 最后一段并加 flickow- 前缀，
    /// clean 子命令靠这个前缀识别自己下载过的文件
    async fn download(
        &self,
        url: &str,
        save_dir: &Path,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let basename = url.rsplit('/').next().unwrap_or("photo.jpg");
        let save_path = save_dir.join(format!("flickow-{basename}"));

        let response = self.client.get(url).send().await?;
        let bytes = response.bytes().await?;

        let mut file = File::create(&save_path).await?;
        file.write_all(&bytes).await?;

        Ok(save_path)
    }
}

#[async_trait]
impl PhotoSource for FlickrClient {
    async fn list_interesting(
        &self,
        options: ListOptions<'_>,
    ) -> Result<Vec<PhotoInfo>, Box<dyn std::error::Error>> {
        let mut params = self.base_params();
        params.push(("method", "flickr.interestingness.getList".to_string()));
        params.push(("per_page", options.per_page.to_string()));
        params.push(("page", options.page.to_string()));

        // date 不传时 Flickr 默认返回最近一期榜单
        if let Some(date) = options.date {
            params.push(("date", date.to_string()));
        }

        let response = self.client.get(&self.endpoint).query(&params).send().await?;
        let list_response: ListResponse = response.json().await?;

        if list_response.stat != "ok" {
            return Err(api_error(
                "flickr.interestingness.getList",
                list_response.code,
                list_response.message,
            ));
        }

        let page = list_response
            .photos
            .ok_or("flickr.interestingness.getList returned no photos")?;

        let info_list = page
            .photo
            .into_iter()
            .map(|p| PhotoInfo {
                id: p.id,
                title: p.title,
            })
            .collect();

        Ok(info_list)
    }

    async fn fetch_photo(
        &self,
        photo: &PhotoInfo,
        rules: &FilterRules,
        save_dir: &Path,
    ) -> Result<FetchOutcome, Box<dyn std::error::Error>> {
        let sizes = self.get_sizes(&photo.id).await?;

        if !sizes.candownload {
            return Ok(FetchOutcome::NotDownloadable);
        }

        // 按接口返回顺序（从小到大）找第一个通过规则的尺寸，
        // 也就是满足下限的最小文件，命中即下载
        let mut saw_bad_ratio = false;
        for size in &sizes.size {
            match rules.check(size.width, size.height) {
                Verdict::Pass => {
                    let save_path = self.download(&size.source, save_dir).await?;
                    return Ok(FetchOutcome::Saved(save_path));
                }
                Verdict::BadRatio => saw_bad_ratio = true,
                Verdict::TooSmall => {}
            }
        }

        // 尺寸够大但比例不合的归为 BadRatio，其余归为 TooSmall
        let verdict = if saw_bad_ratio {
            Verdict::BadRatio
        } else {
            Verdict::TooSmall
        };
        Ok(FetchOutcome::NoMatch(verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> FlickrClient {
        FlickrClient::with_endpoint("test-key".to_string(), server.uri())
    }

    #[test]
    fn dimensions_parse_from_strings_and_numbers() {
        // 老接口返回字符串尺寸
        let size: PhotoSize = serde_json::from_str(
            r#"{"label":"Large","width":"1600","height":"1200","source":"https://x/1_a_b.jpg"}"#,
        )
        .unwrap();
        assert_eq!((size.width, size.height), (1600, 1200));

        // 新接口返回数字尺寸
        let size: PhotoSize = serde_json::from_str(
            r#"{"label":"Large","width":2048,"height":1536,"source":"https://x/1_a_c.jpg"}"#,
        )
        .unwrap();
        assert_eq!((size.width, size.height), (2048, 1536));
    }

    #[test]
    fn candownload_flag_parses_all_shapes() {
        let parse = |raw: &str| -> SizeList { serde_json::from_str(raw).unwrap() };

        assert!(parse(r#"{"candownload":1,"size":[]}"#).candownload);
        assert!(!parse(r#"{"candownload":0,"size":[]}"#).candownload);
        assert!(parse(r#"{"candownload":"1","size":[]}"#).candownload);
        assert!(!parse(r#"{"candownload":"0","size":[]}"#).candownload);
        assert!(parse(r#"{"candownload":true,"size":[]}"#).candownload);
    }

    #[tokio::test]
    async fn list_interesting_returns_photo_infos() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("method", "flickr.interestingness.getList"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("format", "json"))
            .and(query_param("nojsoncallback", "1"))
            .and(query_param("date", "2026-08-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": {
                    "page": 1, "pages": 5, "perpage": 2, "total": 10,
                    "photo": [
                        {"id": "101", "owner": "a@b", "title": "first"},
                        {"id": "102", "owner": "c@d", "title": "second"}
                    ]
                },
                "stat": "ok"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let photos = client
            .list_interesting(ListOptions {
                date: Some("2026-08-01"),
                per_page: 2,
                page: 1,
            })
            .await
            .unwrap();

        let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102"]);
        assert_eq!(photos[0].title, "first");
    }

    #[tokio::test]
    async fn api_failure_envelope_becomes_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stat": "fail", "code": 100, "message": "Invalid API Key"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .list_interesting(ListOptions {
                date: None,
                per_page: 100,
                page: 1,
            })
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Invalid API Key"), "unexpected error: {msg}");
        assert!(msg.contains("100"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn fetch_photo_downloads_first_passing_size() {
        let server = MockServer::start().await;

        // 尺寸列表从小到大，前两个不过规则，后两个都通过，应当取第一个通过的
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("method", "flickr.photos.getSizes"))
            .and(query_param("photo_id", "101"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sizes": {
                    "canblog": 0, "canprint": 0, "candownload": 1,
                    "size": [
                        {"label": "Square", "width": "75", "height": "75",
                         "source": format!("{}/img/101_sq.jpg", server.uri())},
                        {"label": "Medium", "width": "800", "height": "600",
                         "source": format!("{}/img/101_m.jpg", server.uri())},
                        {"label": "Large", "width": "2048", "height": "1536",
                         "source": format!("{}/img/101_l.jpg", server.uri())},
                        {"label": "Original", "width": "4000", "height": "3000",
                         "source": format!("{}/img/101_o.jpg", server.uri())}
                    ]
                },
                "stat": "ok"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/img/101_l.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server);
        let photo = PhotoInfo {
            id: "101".to_string(),
            title: String::new(),
        };

        let outcome = client
            .fetch_photo(&photo, &FilterRules::default(), dir.path())
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Saved(save_path) => {
                assert_eq!(
                    save_path.file_name().unwrap().to_str().unwrap(),
                    "flickow-101_l.jpg"
                );
                let bytes = std::fs::read(&save_path).unwrap();
                assert_eq!(bytes, b"jpeg-bytes");
            }
            other => panic!("expected Saved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_photo_respects_candownload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("method", "flickr.photos.getSizes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sizes": {
                    "candownload": 0,
                    "size": [
                        {"label": "Large", "width": 2048, "height": 1536,
                         "source": "https://example.invalid/101_l.jpg"}
                    ]
                },
                "stat": "ok"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server);
        let photo = PhotoInfo {
            id: "101".to_string(),
            title: String::new(),
        };

        let outcome = client
            .fetch_photo(&photo, &FilterRules::default(), dir.path())
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::NotDownloadable));
        // 目录里不应出现任何文件
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn fetch_photo_reports_why_nothing_matched() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("method", "flickr.photos.getSizes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sizes": {
                    "candownload": 1,
                    "size": [
                        {"label": "Square", "width": 75, "height": 75,
                         "source": "https://example.invalid/101_sq.jpg"},
                        {"label": "Large", "width": 3840, "height": 2160,
                         "source": "https://example.invalid/101_l.jpg"}
                    ]
                },
                "stat": "ok"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server);
        let photo = PhotoInfo {
            id: "101".to_string(),
            title: String::new(),
        };

        // 3840x2160 尺寸够大但 16:9 不在默认比例区间里
        let outcome = client
            .fetch_photo(&photo, &FilterRules::default(), dir.path())
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::NoMatch(Verdict::BadRatio)));
    }
}
