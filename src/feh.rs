// feh.rs — feh 集成模块
// 通过 std::process::Command 调用系统安装的 feh 二进制文件设置 X11 桌面壁纸

use rust_i18n::t;
use std::path::Path; // 路径的不可变借用类型
use std::process::Command; // 用于创建和执行子进程

/// feh 支持的铺排方式，对应 --bg-* 系列参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FehMode {
    /// --bg-scale：拉伸填满屏幕，不保持比例
    Scale,
    /// --bg-fill：保持比例填满屏幕，超出部分裁掉
    Fill,
    /// --bg-center：原始尺寸居中
    Center,
    /// --bg-tile：平铺
    Tile,
    /// --bg-max：保持比例放大到恰好放下整张图
    Max,
}

impl FehMode {
    /// 从配置字符串解析铺排方式
    pub fn parse(mode: &str) -> Result<Self, Box<dyn std::error::Error>> {
        match mode {
            "scale" => Ok(Self::Scale),
            "fill" => Ok(Self::Fill),
            "center" => Ok(Self::Center),
            "tile" => Ok(Self::Tile),
            "max" => Ok(Self::Max),
            other => Err(t!("feh_unknown_mode", mode => other).into()),
        }
    }

    /// 对应的 feh 命令行参数
    fn flag(self) -> &'static str {
        match self {
            Self::Scale => "--bg-scale",
            Self::Fill => "--bg-fill",
            Self::Center => "--bg-center",
            Self::Tile => "--bg-tile",
            Self::Max => "--bg-max",
        }
    }
}

/// 检查系统中是否安装了 feh
///
/// 执行 `feh --version`，命令不存在或退出码非零都视为未安装
pub fn check_installed() -> Result<(), Box<dyn std::error::Error>> {
    let status = Command::new("feh")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);

    if status {
        Ok(())
    } else {
        Err(t!("feh_not_installed").into())
    }
}

/// 调用 `feh --bg-<mode>` 将图片设置为桌面壁纸
///
/// # 参数
/// - `image_path`: 图片路径，`impl AsRef<Path>` 接受多种路径类型
/// - `mode`: 铺排方式
///
/// # 返回值
/// - `Ok(())`: 设置成功
/// - `Err(...)`: 命令执行失败或 feh 返回非零退出码
pub fn set_bg(
    image_path: impl AsRef<Path>,
    mode: FehMode,
) -> Result<(), Box<dyn std::error::Error>> {
    // .output() 同步执行命令，等待完成，捕获 stdout 和 stderr
    let output = Command::new("feh")
        .arg(mode.flag())
        .arg(image_path.as_ref().as_os_str())
        .output()?;

    // output.status.success() 检查退出码是否为 0
    if output.status.success() {
        Ok(())
    } else {
        // 命令执行失败，将 stderr 内容作为错误信息返回
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Err(t!("feh_failed", reason => stderr).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_strings_parse() {
        assert_eq!(FehMode::parse("scale").unwrap(), FehMode::Scale);
        assert_eq!(FehMode::parse("fill").unwrap(), FehMode::Fill);
        assert_eq!(FehMode::parse("center").unwrap(), FehMode::Center);
        assert_eq!(FehMode::parse("tile").unwrap(), FehMode::Tile);
        assert_eq!(FehMode::parse("max").unwrap(), FehMode::Max);
        assert!(FehMode::parse("stretch").is_err());
    }

    #[test]
    fn modes_map_to_bg_flags() {
        assert_eq!(FehMode::Scale.flag(), "--bg-scale");
        assert_eq!(FehMode::Fill.flag(), "--bg-fill");
        assert_eq!(FehMode::Max.flag(), "--bg-max");
    }
}
