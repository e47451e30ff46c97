use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

pub fn is_gzipped(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 2];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1F, 0x8B]), // Gzip magic bytes
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detects_gzip_magic() -> io::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"sample\t10\t9\n")?;
        tmp.write_all(&encoder.finish()?)?;
        tmp.flush()?;
        assert!(is_gzipped(tmp.path())?);
        Ok(())
    }

    #[test]
    fn test_plain_text_is_not_gzip() -> io::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"sample\t10\t9\n")?;
        tmp.flush()?;
        assert!(!is_gzipped(tmp.path())?);
        Ok(())
    }
}
