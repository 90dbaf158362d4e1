//! 按扩展名猜测 MIME 类型
//!
//! 只覆盖桌面剪贴板里常见的文件类型；猜不出时返回 `None`，分类器会丢弃该条目。

use std::path::Path;

/// 根据扩展名猜测 MIME 类型（不区分大小写）。
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",

        "txt" | "log" | "ini" | "cfg" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "xml" => "text/xml",
        "py" => "text/x-python",
        "java" => "text/x-java",
        "rs" => "text/x-rust",
        "sql" => "text/x-sql",

        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" | "tgz" => "application/gzip",
        "rar" => "application/vnd.rar",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "exe" | "msi" | "dll" => "application/x-msdownload",
        "jar" => "application/java-archive",

        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",

        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",

        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => return None,
    };

    Some(mime)
}

/// 图像解码器能处理的位图类型；矢量图等其余 `image/*` 按普通文件保存。
pub fn is_decodable_image(mime: &str) -> bool {
    matches!(
        mime,
        "image/png"
            | "image/jpeg"
            | "image/gif"
            | "image/bmp"
            | "image/webp"
            | "image/vnd.microsoft.icon"
            | "image/tiff"
    )
}

/// MIME 顶级类别，例如 `application/pdf` → `application`。
pub fn mime_category(mime: &str) -> &str {
    mime.split('/').next().unwrap_or(mime)
}
