//! Line oriented access to file contents, decrypting encrypted notes on the fly
use crate::error::{FitgrepError, Result};
use crate::search::crypto::{Decryptor, ENCRYPTED_FILE_SUFFIX};
use secrecy::SecretString;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Arc;

const BINARY_CHECK_SIZE: usize = 8000;

/// Extensions of formats the notes application opens as text.
const TEXT_EXTENSIONS: &[&str] = &[
    // Markdown family
    "md", "markdown", "mkd", "mdown", "mkdn", "mdwn", "mdx", "text", "rmd",
    // Plain text and other note formats
    "txt", "taskpaper", "org", "ldg", "ledger", "m3u", "m3u8", "csv", "json", "adoc", "asciidoc",
    "wiki", "html", "htm",
    // Source code the editor highlights
    "py", "cpp", "h", "c", "js", "mjs", "css", "cs", "kt", "lua", "perl", "java", "qml", "diff",
    "php", "r", "patch", "rs", "swift", "ts", "mm", "go", "sh", "rb", "tex", "xml", "xlf",
];

/// Decides whether a file is worth searching line by line.
pub trait TextFileDetector: Send + Sync {
    fn is_text_file(&self, path: &Path) -> bool;
}

/// Name based detection with a content sniff for names that say nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionSniffer;

impl TextFileDetector for ExtensionSniffer {
    fn is_text_file(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_lowercase(),
            None => return false,
        };
        let name = name.strip_suffix(ENCRYPTED_FILE_SUFFIX).unwrap_or(&name);

        if let Some((_, ext)) = name.rsplit_once('.') {
            if TEXT_EXTENSIONS.contains(&ext) {
                return true;
            }
            if let Some(mime) = mime_guess::from_ext(ext).first() {
                return mime.type_() == mime_guess::mime::TEXT;
            }
        }

        // Encrypted content can not be sniffed
        if is_encrypted_file(path) {
            return false;
        }
        !is_binary(path)
    }
}

/// Heuristic: more than 30% NUL bytes in the first block means binary.
pub fn is_binary(path: &Path) -> bool {
    if let Ok(mut file) = File::open(path) {
        let mut buffer = vec![0u8; BINARY_CHECK_SIZE];
        if let Ok(n) = file.read(&mut buffer) {
            if n > 0 {
                let null_bytes = buffer[..n].iter().filter(|&&b| b == 0).count();
                return (null_bytes as f64 / n as f64) > 0.3;
            }
        }
    }
    false
}

pub fn is_encrypted_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(ENCRYPTED_FILE_SUFFIX))
}

/// Opens files for reading, decrypting `.jenc` files with the request password.
pub struct ContentReader {
    decryptor: Arc<dyn Decryptor>,
    password: Option<SecretString>,
}

impl ContentReader {
    pub fn new(decryptor: Arc<dyn Decryptor>, password: Option<SecretString>) -> Self {
        Self {
            decryptor,
            password,
        }
    }

    pub fn set_decryptor(&mut self, decryptor: Arc<dyn Decryptor>) {
        self.decryptor = decryptor;
    }

    pub fn open(&self, path: &Path) -> Result<Box<dyn BufRead>> {
        if !is_encrypted_file(path) {
            return Ok(Box::new(BufReader::new(File::open(path)?)));
        }

        let password = self
            .password
            .as_ref()
            .ok_or_else(|| FitgrepError::Decryption("no password given".to_string()))?;
        let payload = std::fs::read(path)?;
        let plaintext = self.decryptor.decrypt(&payload, password)?;
        Ok(Box::new(Cursor::new(plaintext)))
    }
}

/// Reads `reader` line by line, handing each line with its zero-based number to `visit`.
///
/// Lines end at `\n`, a trailing `\r` is dropped and invalid UTF-8 is replaced.
/// Returning `false` from `visit` stops reading.
pub fn for_each_line<R, F>(mut reader: R, mut visit: F) -> std::io::Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str) -> bool,
{
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if !visit(line_number, &String::from_utf8_lossy(&buf)) {
            return Ok(());
        }
        line_number += 1;
    }
}
