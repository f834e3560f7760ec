use crate::error::{ErrorKind, Result};
use crate::walk::walk;
use exn::ResultExt;
use pistore_chunk::{Chunk, Compression, Origin, Poid, Verification};
use pistore_config::Config;
use pistore_identity::{HostId, absolute_path};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// The configured host ID, or one derived from this machine.
fn resolve_host(config: &Config) -> Result<HostId> {
    match &config.host_id {
        Some(host) => Ok(host.clone()),
        None => HostId::from_system().or_raise(|| ErrorKind::HostIdentity),
    }
}

pub fn host_id(config: &Config) -> Result<ExitCode> {
    println!("{}", resolve_host(config)?);
    Ok(ExitCode::SUCCESS)
}

pub fn scan(config: &Config, root: &Path) -> Result<ExitCode> {
    let host = resolve_host(config)?;
    scan_with(&host, root, |path, poid| println!("{}\t{poid}", path.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Walk `root` and hand every path, with its POID, to `report`. Returns the
/// number of entries seen.
fn scan_with(host: &HostId, root: &Path, mut report: impl FnMut(&Path, Poid)) -> Result<usize> {
    let root = absolute_path(root).or_raise(|| ErrorKind::Scan(root.to_path_buf()))?;
    let mut entries = 0usize;
    walk(&root, |path| {
        let poid = Poid::derive(host, path);
        tracing::debug!(path = %path.display(), %poid, "processing path");
        report(path, poid);
        entries += 1;
        Ok(())
    })?;
    tracing::info!(root = %root.display(), entries, "scan complete");
    Ok(entries)
}

pub fn pack(config: &Config, file: &Path, birth_version: u64, offset: u64, length: Option<u64>) -> Result<ExitCode> {
    let host = resolve_host(config)?;
    let path = pack_file(config, &host, file, birth_version, offset, length)?;
    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn pack_file(
    config: &Config,
    host: &HostId,
    file: &Path,
    birth_version: u64,
    offset: u64,
    length: Option<u64>,
) -> Result<PathBuf> {
    let poid = Poid::resolve(host, file).or_raise(|| ErrorKind::Pack(file.to_path_buf()))?;
    let data = read_range(file, offset, length)?;
    let chunk = Chunk::compress(Origin::new(birth_version, poid, offset), config.compression, &data)
        .or_raise(|| ErrorKind::Pack(file.to_path_buf()))?;
    fs::create_dir_all(&config.chunk_dir).or_raise(|| ErrorKind::Store(config.chunk_dir.clone()))?;
    let path = chunk.dump_to_file(&config.chunk_dir).or_raise(|| ErrorKind::Store(config.chunk_dir.clone()))?;
    tracing::info!(
        file = %file.display(),
        %poid,
        chunk_id = %chunk.id(),
        original_size = chunk.original_size(),
        compressed_size = chunk.compressed_size(),
        "packed chunk"
    );
    Ok(path)
}

/// Read `length` bytes (or everything) from `offset` onwards. Short reads at
/// end of file are not an error.
fn read_range(path: &Path, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
    let read = || -> std::io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut data = Vec::new();
        match length {
            Some(length) => file.take(length).read_to_end(&mut data)?,
            None => file.read_to_end(&mut data)?,
        };
        Ok(data)
    };
    read().or_raise(|| ErrorKind::Read(path.to_path_buf()))
}

pub fn verify(files: &[PathBuf], json: bool) -> Result<ExitCode> {
    let failed = verify_all(files, json)?;
    if failed > 0 {
        tracing::warn!(failed, total = files.len(), "damaged chunks found");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Returns how many files failed to load or verify.
fn verify_all(files: &[PathBuf], json: bool) -> Result<usize> {
    let mut failed = 0;
    for path in files {
        match check(path) {
            Ok((chunk, report)) => {
                if json {
                    println!("{}", chunk.to_json_pretty().or_raise(|| ErrorKind::Read(path.clone()))?);
                } else {
                    println!("{}: {report}", path.display());
                }
                if !report.is_valid() {
                    tracing::warn!(path = %path.display(), %report, "chunk failed verification");
                    failed += 1;
                }
                if let Some(detected) = label_mismatch(&chunk) {
                    tracing::warn!(
                        path = %path.display(),
                        recorded = chunk.compression_alg(),
                        %detected,
                        "payload doesn't look like its recorded compression"
                    );
                }
            },
            Err(err) => {
                tracing::error!("{err:?}");
                println!("{}: unreadable", path.display());
                failed += 1;
            },
        }
    }
    Ok(failed)
}

/// The scheme the payload looks like, when that contradicts the header.
fn label_mismatch(chunk: &Chunk) -> Option<Compression> {
    let detected = chunk.detected_compression();
    (detected != Compression::None && chunk.compression().ok() != Some(detected)).then_some(detected)
}

fn check(path: &Path) -> Result<(Chunk, Verification)> {
    let raw = fs::read(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let chunk = Chunk::deserialize(&raw).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let report = chunk.verify(Some(&raw));
    Ok((chunk, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pistore_chunk::Precompressed;
    use rstest::rstest;

    const CONTENT: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    fn test_config(chunk_dir: &Path) -> Config {
        Config {
            chunk_dir: chunk_dir.to_path_buf(),
            compression: Compression::Bzip2,
            host_id: Some(HostId::new("test-host").unwrap()),
            ..Config::default()
        }
    }

    #[rstest]
    #[case(0, None, CONTENT)]
    #[case(10, None, &CONTENT[10..])]
    #[case(10, Some(5), &CONTENT[10..15])]
    #[case(30, Some(100), &CONTENT[30..])]
    #[case(100, Some(5), b"")]
    fn reads_requested_range(#[case] offset: u64, #[case] length: Option<u64>, #[case] expected: &[u8]) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("source.bin");
        fs::write(&file, CONTENT).unwrap();
        assert_eq!(read_range(&file, offset, length).unwrap(), expected);
    }

    #[test]
    fn missing_source_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_range(&dir.path().join("nope"), 0, None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read(_)));
    }

    #[test]
    fn packed_chunk_carries_file_identity() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("source.bin");
        fs::write(&file, CONTENT).unwrap();
        let config = test_config(&dir.path().join("chunks"));
        let host = resolve_host(&config).unwrap();

        let path = pack_file(&config, &host, &file, 7, 4, Some(8)).unwrap();
        assert!(path.starts_with(&config.chunk_dir));

        let chunk = Chunk::load(&path).unwrap();
        assert_eq!(chunk.birth_version(), 7);
        assert_eq!(chunk.offset(), 4);
        assert_eq!(chunk.poid(), Poid::resolve(&host, &file).unwrap());
        assert_eq!(chunk.compression_alg(), "bzip2");
        assert_eq!(chunk.decompress().unwrap(), &CONTENT[4..12]);
    }

    #[test]
    fn verify_counts_damaged_and_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("source.bin");
        fs::write(&file, CONTENT).unwrap();
        let config = test_config(&dir.path().join("chunks"));
        let host = resolve_host(&config).unwrap();

        let good = pack_file(&config, &host, &file, 1, 0, None).unwrap();
        let damaged = pack_file(&config, &host, &file, 2, 0, None).unwrap();
        let mut raw = fs::read(&damaged).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        fs::write(&damaged, raw).unwrap();
        let garbage = dir.path().join("garbage.chunk");
        fs::write(&garbage, b"nope").unwrap();

        assert_eq!(verify_all(std::slice::from_ref(&good), false).unwrap(), 0);
        assert_eq!(verify_all(&[good.clone(), damaged, garbage, dir.path().join("absent.chunk")], false).unwrap(), 3);
        assert_eq!(verify_all(&[good], true).unwrap(), 0);
    }

    #[test]
    fn label_mismatch_reports_detected_scheme() {
        let config = test_config(Path::new("unused"));
        let host = resolve_host(&config).unwrap();
        let poid = Poid::derive(&host, "/data/file");
        let honest = Chunk::compress(Origin::new(1, poid, 0), Compression::Gzip, CONTENT).unwrap();
        assert_eq!(label_mismatch(&honest), None);

        let compressed = Compression::Gzip.compress(CONTENT).unwrap();
        let relabelled = Chunk::from_compressed_data(1, poid, 0, Precompressed {
            original_size: CONTENT.len() as u64,
            compressed_size: compressed.len() as u64,
            original: CONTENT,
            compressed: &compressed,
            algorithm: "bzip2",
        })
        .unwrap();
        assert_eq!(label_mismatch(&relabelled), Some(Compression::Gzip));
    }

    #[test]
    fn scan_root_spelling_does_not_change_poids() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data/nested")).unwrap();
        fs::write(dir.path().join("data/nested/file.txt"), CONTENT).unwrap();
        let host = HostId::new("test-host").unwrap();

        let collect = |root: PathBuf| {
            let mut seen = vec![];
            scan_with(&host, &root, |path, poid| seen.push((path.to_path_buf(), poid))).unwrap();
            seen
        };
        let direct = collect(dir.path().join("data"));
        assert_eq!(direct.len(), 3);
        assert_eq!(direct, collect(dir.path().join("data/nested/../")));
        assert_eq!(direct, collect(dir.path().join("./data/")));
        let (file, poid) = &direct[2];
        assert_eq!(*poid, Poid::resolve(&host, file).unwrap());
    }
}
