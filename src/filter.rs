// filter.rs — 尺寸与宽高比筛选规则模块
// 纯逻辑，不涉及网络与 IO

/// 照片尺寸的筛选规则
///
/// 所有比较均为严格比较：宽高必须严格大于下限，
/// 宽高比必须落在开区间 (ratio_min, ratio_max) 内。
/// 1600x1200 在默认规则下是不通过的。
#[derive(Debug, Clone, Copy)]
pub struct FilterRules {
    /// 最小宽度（像素）
    pub min_width: u32,
    /// 最小高度（像素）
    pub min_height: u32,
    /// 宽高比下限（宽 / 高）
    pub ratio_min: f64,
    /// 宽高比上限（宽 / 高）
    pub ratio_max: f64,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            min_width: 1600,
            min_height: 1200,
            ratio_min: 1.3,
            ratio_max: 1.4,
        }
    }
}

/// 单个尺寸的判定结果
///
/// 区分「太小」和「比例不对」两种不通过的原因，
/// 调用方据此打印对应的跳过提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 通过筛选
    Pass,
    /// 宽或高未超过下限
    TooSmall,
    /// 尺寸够大但宽高比不在区间内
    BadRatio,
}

impl FilterRules {
    /// 判定一个尺寸是否通过规则
    pub fn check(&self, width: u32, height: u32) -> Verdict {
        if width <= self.min_width || height <= self.min_height {
            return Verdict::TooSmall;
        }
        // 高度经过上面的下限检查后必然非零，这里可以安全做除法
        let ratio = f64::from(width) / f64::from(height);
        if ratio > self.ratio_min && ratio < self.ratio_max {
            Verdict::Pass
        } else {
            Verdict::BadRatio
        }
    }

    /// 用 "MIN:MAX" 格式的字符串覆盖宽高比区间
    pub fn with_ratio_window(mut self, raw: &str) -> Result<Self, String> {
        let (min, max) = parse_ratio(raw)?;
        self.ratio_min = min;
        self.ratio_max = max;
        Ok(self)
    }
}

/// 解析 "MIN:MAX" 格式的宽高比区间（如 "1.3:1.4"）
///
/// 要求两端都是正数且 MIN < MAX，否则返回描述性错误
pub fn parse_ratio(raw: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = raw.splitn(2, ':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid ratio window {raw:?}, expected MIN:MAX"));
    }
    let min: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("invalid ratio lower bound {:?}", parts[0]))?;
    let max: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("invalid ratio upper bound {:?}", parts[1]))?;
    if !(min > 0.0 && max > 0.0 && min < max) {
        return Err(format!("invalid ratio window {raw:?}, expected 0 < MIN < MAX"));
    }
    Ok((min, max))
}
