use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt as _;
use futures::future::LocalBoxFuture;

/// A file handed over by a picker, a drop or a paste.
pub trait FileHandle {
    fn name(&self) -> &str;
    /// MIME type as reported by the host, possibly empty.
    fn mime(&self) -> &str;
    fn read(&self) -> LocalBoxFuture<'_, std::io::Result<Vec<u8>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }
}

impl FileHandle for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime(&self) -> &str {
        &self.mime
    }

    fn read(&self) -> LocalBoxFuture<'_, std::io::Result<Vec<u8>>> {
        futures::future::ready(Ok(self.bytes.clone())).boxed_local()
    }
}

/// Payload of a paste or drop.
#[derive(Default)]
pub struct DataTransfer {
    pub text: Option<String>,
    pub files: Vec<Box<dyn FileHandle>>,
}

impl DataTransfer {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            files: Vec::new(),
        }
    }

    pub fn files(files: Vec<Box<dyn FileHandle>>) -> Self {
        Self { text: None, files }
    }
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.split('/').next() == Some("image")
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub async fn read_data_url(file: &dyn FileHandle) -> std::io::Result<String> {
    let bytes = file.read().await?;
    Ok(data_url(file.mime(), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_carry_mime_and_base64() {
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
        assert_eq!(data_url("", b""), "data:application/octet-stream;base64,");
    }

    #[test]
    fn only_image_mimes_match() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/svg+xml"));
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime("imagery/x"));
        assert!(!is_image_mime(""));
    }
}
