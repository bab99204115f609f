//! `multipart/form-data` payload construction.
//!
//! # Design
//! The whole payload is assembled in memory before the request is sent:
//! attachment readers are drained here, synchronously, so the transport only
//! ever sees a finished byte buffer. A `MultipartBody` is moved into the
//! request that sends it and cannot be reused.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use uuid::Uuid;

use crate::error::RestError;
use crate::http::Values;

/// A named byte source to upload as a file part.
pub struct Attachment {
    name: String,
    reader: Box<dyn Read>,
}

impl Attachment {
    /// `name` may be a full path; only its base name is sent.
    pub fn new(name: impl Into<String>, reader: impl Read + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, std::io::Cursor::new(bytes.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A finished multipart payload and its matching content type.
#[derive(Debug, PartialEq, Eq)]
pub struct MultipartBody {
    content_type: String,
    buf: Vec<u8>,
}

impl MultipartBody {
    /// Build one payload from scalar `params` and file attachments keyed by
    /// form field name.
    ///
    /// Fails when an attachment cannot be read to the end, or when there is
    /// nothing at all to send.
    pub fn new(
        params: &Values,
        files: BTreeMap<String, Vec<Attachment>>,
    ) -> Result<Self, RestError> {
        let has_files = files.values().any(|list| !list.is_empty());
        if params.is_empty() && !has_files {
            return Err(RestError::MultipartConstructionFailed(
                "no fields and no files to send".to_string(),
            ));
        }

        let boundary = Uuid::new_v4().simple().to_string();
        let mut buf = Vec::new();

        for (field, attachments) in files {
            for mut attachment in attachments {
                let mut data = Vec::new();
                attachment.reader.read_to_end(&mut data).map_err(|e| {
                    RestError::MultipartConstructionFailed(format!(
                        "reading attachment {:?} for field {field:?}: {e}",
                        attachment.name
                    ))
                })?;

                buf.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                buf.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        escape_quotes(&field),
                        escape_quotes(base_name(&attachment.name)),
                    )
                    .as_bytes(),
                );
                buf.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                buf.extend_from_slice(&data);
                buf.extend_from_slice(b"\r\n");
            }
        }

        for (key, value) in params.pairs() {
            buf.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            buf.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_quotes(key)
                )
                .as_bytes(),
            );
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        // closing boundary
        buf.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(Self {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            buf,
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn boundary(&self) -> &str {
        self.content_type
            .rsplit_once("boundary=")
            .map(|(_, b)| b)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>) {
        (self.content_type, self.buf)
    }
}

/// Last path component, accepting both separators.
fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    match trimmed.rsplit(['/', '\\']).next() {
        Some(base) if !base.is_empty() => base,
        _ => name,
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
        }
    }

    fn body_text(body: &MultipartBody) -> String {
        String::from_utf8(body.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn file_and_field_parts_are_written() {
        let mut params = Values::new();
        params.set("name", "example");
        let mut files = BTreeMap::new();
        files.insert(
            "file".to_string(),
            vec![Attachment::from_bytes("/tmp/reports/report.txt", "file contents")],
        );

        let body = MultipartBody::new(&params, files).unwrap();
        let text = body_text(&body);
        let boundary = body.boundary().to_string();

        assert_eq!(body.content_type(), format!("multipart/form-data; boundary={boundary}"));
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"file\"; filename=\"report.txt\"\r\n"
        ));
        assert!(text.contains("Content-Type: application/octet-stream\r\n\r\nfile contents\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"name\"\r\n\r\nexample\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn every_attachment_of_a_field_becomes_a_part() {
        let mut files = BTreeMap::new();
        files.insert(
            "docs".to_string(),
            vec![
                Attachment::from_bytes("a.txt", "A"),
                Attachment::from_bytes("b.txt", "B"),
            ],
        );
        let body = MultipartBody::new(&Values::new(), files).unwrap();
        let text = body_text(&body);
        assert_eq!(text.matches("name=\"docs\"").count(), 2);
        assert!(text.contains("filename=\"a.txt\""));
        assert!(text.contains("filename=\"b.txt\""));
    }

    #[test]
    fn boundaries_differ_between_bodies() {
        let mut params = Values::new();
        params.set("k", "v");
        let first = MultipartBody::new(&params, BTreeMap::new()).unwrap();
        let second = MultipartBody::new(&params, BTreeMap::new()).unwrap();
        assert_ne!(first.boundary(), second.boundary());
    }

    #[test]
    fn empty_builder_is_rejected() {
        let err = MultipartBody::new(&Values::new(), BTreeMap::new()).unwrap_err();
        assert!(matches!(err, RestError::MultipartConstructionFailed(_)));

        let mut files = BTreeMap::new();
        files.insert("file".to_string(), Vec::new());
        let err = MultipartBody::new(&Values::new(), files).unwrap_err();
        assert!(matches!(err, RestError::MultipartConstructionFailed(_)));
    }

    #[test]
    fn unreadable_attachment_fails() {
        let mut files = BTreeMap::new();
        files.insert("file".to_string(), vec![Attachment::new("broken.bin", FailingReader)]);
        let err = MultipartBody::new(&Values::new(), files).unwrap_err();
        match err {
            RestError::MultipartConstructionFailed(msg) => assert!(msg.contains("broken.bin")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let mut params = Values::new();
        params.set("say \"hi\"", "x");
        let body = MultipartBody::new(&params, BTreeMap::new()).unwrap();
        assert!(body_text(&body).contains("name=\"say \\\"hi\\\"\""));
    }

    #[test]
    fn base_name_handles_both_separators() {
        assert_eq!(base_name("dir/sub/file.png"), "file.png");
        assert_eq!(base_name("C:\\Users\\me\\photo.jpg"), "photo.jpg");
        assert_eq!(base_name("plain.txt"), "plain.txt");
    }
}
