//! # 同步抓取适配层
//!
//! 剪贴板监听回调运行在普通线程上，需要“同步”拿到网络图片。
//! `HttpImageFetcher` 每次抓取临时创建单线程 tokio 运行时，用 `block_on` 驱动异步加载，
//! 抓取结束即释放。抓取器本身不持有运行时，因此可以在异步上下文中创建和丢弃。

use super::loader::ImageLoader;
use super::pipeline::decode_and_validate;
use super::source::ImagePayload;
use super::{ImageConfig, ImageError};

/// 分类器使用的网络协作者：给定 URL，返回校验过的图片。
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<ImagePayload, ImageError>;
}

/// 基于 reqwest 的默认实现。
pub struct HttpImageFetcher {
    loader: ImageLoader,
}

impl HttpImageFetcher {
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        Ok(Self {
            loader: ImageLoader::new(config)?,
        })
    }

    fn fetch_blocking(&self, url: &str) -> Result<ImagePayload, ImageError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ImageError::Network(format!("创建下载运行时失败：{}", e)))?;

        let raw = runtime.block_on(self.loader.load_from_url(url))?;
        decode_and_validate(raw, self.loader.config())
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<ImagePayload, ImageError> {
        // 已处于异步上下文时不能嵌套 block_on，转到独立线程执行
        if tokio::runtime::Handle::try_current().is_ok() {
            return std::thread::scope(|scope| {
                scope
                    .spawn(|| self.fetch_blocking(url))
                    .join()
                    .unwrap_or_else(|_| Err(ImageError::Network("图片下载线程异常退出".to_string())))
            });
        }

        self.fetch_blocking(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::encode_rgba_as_png;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn fetch_returns_decoded_png() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");
        let png = encode_rgba_as_png(4, 3, vec![7; 48]).expect("encode failed").bytes;

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                png.len()
            );
            stream.write_all(head.as_bytes()).expect("write headers failed");
            stream.write_all(&png).expect("write body failed");
        });

        let fetcher = HttpImageFetcher::new(ImageConfig::default()).expect("fetcher init failed");
        let payload = fetcher
            .fetch(&format!("http://127.0.0.1:{}/pic.png", addr.port()))
            .expect("fetch should succeed");

        server.join().expect("server thread failed");
        assert_eq!((payload.width, payload.height), (4, 3));
        assert_eq!(payload.format, "png");
    }

    #[tokio::test]
    async fn fetcher_lives_and_drops_inside_async_context() {
        let fetcher = HttpImageFetcher::new(ImageConfig::default()).expect("fetcher init failed");
        assert!(matches!(
            fetcher.fetch("ftp://example.com/a.png"),
            Err(ImageError::InvalidFormat(_))
        ));
        drop(fetcher);
    }

    #[test]
    fn fetch_rejects_non_http_scheme() {
        let fetcher = HttpImageFetcher::new(ImageConfig::default()).expect("fetcher init failed");
        assert!(matches!(
            fetcher.fetch("ftp://example.com/a.png"),
            Err(ImageError::InvalidFormat(_))
        ));
    }
}
