use codecollate::{
    ContentReader, DiscoveryError, DiscoveryOptions, EncodingGuess, EncodingResolver, FileRecord,
    FilterRule, FixedResolver, GuessSource, MemoryFileSystem, OsFileSystem, OutputFormat,
    PathStyle, ReadFailure, ReadFailureReason, SniffingResolver, assemble, discover,
    discover_with, read, write_summary,
};
use encoding_rs::{UTF_8, UTF_16LE, WINDOWS_1252};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

fn rule(valid: &[&str], skip: &[&str], folders: &[&str]) -> FilterRule {
    FilterRule::new(valid.iter(), skip.iter(), folders.iter().copied())
}

fn names(paths: &[codecollate::DiscoveredPath]) -> Vec<String> {
    paths.iter().map(|p| p.display_path().to_string()).collect()
}

fn rel(parts: &[&str]) -> String {
    parts
        .iter()
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

#[test]
fn test_filter_rule_normalizes_extensions() {
    let rule = rule(&["PY", ".Rs", "  .txt ", ""], &["JPG"], &["target"]);
    let valid: Vec<_> = rule.valid_extensions().iter().cloned().collect();
    assert_eq!(valid, vec![".py", ".rs", ".txt"]);
    assert!(rule.skip_extensions().contains(".jpg"));
    assert!(rule.skips_folder("target"));
    assert!(!rule.skips_folder("Target"));
}

#[test]
fn test_default_rule_covers_common_sources() {
    let rule = FilterRule::default();
    assert!(rule.accepts_extension(".py"));
    assert!(rule.accepts_extension(".rs"));
    assert!(!rule.accepts_extension(".jpg"));
    assert!(rule.skip_extensions().is_empty());
}

#[test]
fn test_skip_extension_wins_over_valid() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "print('a')").unwrap();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    fs::write(dir.path().join("c.jpg"), "not relevant").unwrap();
    let found = discover(dir.path(), &rule(&[".py", ".txt"], &[".txt"], &[])).unwrap();
    assert_eq!(names(&found), vec!["a.py"]);
}

#[test]
fn test_discover_missing_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does_not_exist");
    let err = discover(&missing, &rule(&[".py"], &[], &[])).unwrap_err();
    assert!(matches!(err, DiscoveryError::NotFound { ref root } if *root == missing));
    assert!(err.to_string().contains("does_not_exist"));
}

#[test]
fn test_discover_root_that_is_a_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.py");
    fs::write(&file, "x").unwrap();
    let err = discover(&file, &rule(&[".py"], &[], &[])).unwrap_err();
    assert!(matches!(err, DiscoveryError::NotFound { .. }));
}

#[test]
fn test_discover_order_is_depth_first_by_name() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
    fs::write(dir.path().join("z.py"), "").unwrap();
    fs::write(dir.path().join("b.py"), "").unwrap();
    fs::write(dir.path().join("a.py"), "").unwrap();
    fs::write(dir.path().join("sub/c.py"), "").unwrap();
    fs::write(dir.path().join("sub/deeper/d.py"), "").unwrap();
    let rule = rule(&[".py"], &[], &[]);

    let first = discover(dir.path(), &rule).unwrap();
    assert_eq!(
        names(&first),
        vec![
            rel(&["a.py"]),
            rel(&["b.py"]),
            rel(&["sub", "c.py"]),
            rel(&["sub", "deeper", "d.py"]),
            rel(&["z.py"]),
        ]
    );
    let second = discover(dir.path(), &rule).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_skip_folders_prune_at_any_depth() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
    fs::create_dir_all(dir.path().join("src/node_modules")).unwrap();
    fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();
    fs::write(dir.path().join("src/node_modules/x.js"), "").unwrap();
    fs::write(dir.path().join("src/main.js"), "").unwrap();
    let found = discover(dir.path(), &rule(&[".js"], &[], &["node_modules"])).unwrap();
    assert_eq!(names(&found), vec![rel(&["src", "main.js"])]);
}

#[test]
fn test_skipped_folders_are_never_listed() {
    // listing a denied folder would fail the walk
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/main.py", "print(1)");
    fs.add_file("/proj/.venv/lib/site.py", "");
    fs.deny("/proj/.venv");
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[".venv"]),
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    assert_eq!(names(&found), vec!["main.py"]);
}

#[test]
fn test_walk_error_fails_discovery() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/main.py", "print(1)");
    fs.add_file("/proj/locked/inner.py", "");
    fs.deny("/proj/locked");
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        ..Default::default()
    };
    let err = discover_with(&fs, Path::new("/proj"), &options).unwrap_err();
    match err {
        DiscoveryError::Io { path, source } => {
            assert_eq!(path, Path::new("/proj/locked"));
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_extension_match_ignores_case_and_needs_an_extension() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/Main.PY", "");
    fs.add_file("/proj/Makefile", "");
    fs.add_file("/proj/.py", "");
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    assert_eq!(names(&found), vec!["Main.PY"]);
}

#[test]
fn test_non_regular_entries_are_excluded() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/real.py", "");
    fs.add_special("/proj/link.py");
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    assert_eq!(names(&found), vec!["real.py"]);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_excluded_on_disk() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.py"), "").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.py"), dir.path().join("alias.py")).unwrap();
    let found = discover(dir.path(), &rule(&[".py"], &[], &[])).unwrap();
    assert_eq!(names(&found), vec!["real.py"]);
}

#[test]
fn test_exclude_patterns() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/app.py", "");
    fs.add_file("/proj/app_test.py", "");
    fs.add_file("/proj/pkg/util_test.py", "");
    fs.add_file("/proj/gen/schema.py", "");
    fs.deny("/proj/gen");
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        exclude_patterns: vec!["*_test.py".into(), "gen".into()],
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    assert_eq!(names(&found), vec!["app.py"]);
}

#[test]
fn test_invalid_exclude_pattern() {
    let dir = tempdir().unwrap();
    let options = DiscoveryOptions {
        exclude_patterns: vec!["[".into()],
        ..Default::default()
    };
    let err = discover_with(&OsFileSystem, dir.path(), &options).unwrap_err();
    assert!(matches!(err, DiscoveryError::InvalidPattern { ref pattern, .. } if pattern == "["));
}

#[test]
fn test_gitignore_is_opt_in() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("build")).unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join(".gitignore"), "build/\nsecret.py\n").unwrap();
    fs::write(dir.path().join("sub/.gitignore"), "local.py\n!secret.py\n").unwrap();
    fs::write(dir.path().join("build/out.py"), "").unwrap();
    fs::write(dir.path().join("keep.py"), "").unwrap();
    fs::write(dir.path().join("secret.py"), "").unwrap();
    fs::write(dir.path().join("sub/local.py"), "").unwrap();
    fs::write(dir.path().join("sub/other.py"), "").unwrap();
    fs::write(dir.path().join("sub/secret.py"), "").unwrap();

    let mut options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        ..Default::default()
    };
    let all = discover_with(&OsFileSystem, dir.path(), &options).unwrap();
    assert_eq!(all.len(), 6);

    options.respect_gitignore = true;
    let kept = discover_with(&OsFileSystem, dir.path(), &options).unwrap();
    assert_eq!(
        names(&kept),
        vec![
            rel(&["keep.py"]),
            rel(&["sub", "other.py"]),
            rel(&["sub", "secret.py"]),
        ]
    );
}

#[test]
fn test_absolute_path_style() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "").unwrap();
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        path_style: PathStyle::Absolute,
        ..Default::default()
    };
    let found = discover_with(&OsFileSystem, dir.path(), &options).unwrap();
    let shown = Path::new(found[0].display_path());
    assert!(shown.is_absolute());
    assert!(shown.ends_with("a.py"));
}

#[test]
fn test_sniffing_resolver() {
    let resolver = SniffingResolver;

    let plain = resolver.detect("héllo wörld".as_bytes());
    assert_eq!(plain.encoding, UTF_8);
    assert_eq!(plain.source, GuessSource::Utf8);

    let bom8 = resolver.detect(b"\xEF\xBB\xBFabc");
    assert_eq!((bom8.encoding, bom8.source), (UTF_8, GuessSource::Bom));

    let bom16 = resolver.detect(b"\xFF\xFEh\0i\0");
    assert_eq!((bom16.encoding, bom16.source), (UTF_16LE, GuessSource::Bom));

    // a sequence cut off by the end of the sample is still UTF-8
    let cut = resolver.detect(b"caf\xC3");
    assert_eq!((cut.encoding, cut.source), (UTF_8, GuessSource::Utf8));

    let binary = resolver.detect(b"\x00\x01\x02\x03\xFF");
    assert_eq!((binary.encoding, binary.source), (UTF_8, GuessSource::Default));
}

#[test]
fn test_sniffing_resolver_falls_back_to_statistics() {
    let sample = b"Le caf\xe9 \xe9tait d\xe9j\xe0 pr\xeat, la cr\xe8me br\xfbl\xe9e aussi. \
                   Tr\xe8s bien, merci beaucoup \xe0 vous.";
    let guess = SniffingResolver.detect(sample);
    assert_eq!(guess.source, GuessSource::Statistical);
    assert_ne!(guess.encoding, UTF_8);
    assert_eq!(SniffingResolver.detect(sample), guess);
}

#[test]
fn test_fixed_resolver_by_label() {
    let resolver = FixedResolver::for_label("latin1").unwrap();
    let guess = resolver.detect(b"anything");
    assert_eq!(guess.encoding, WINDOWS_1252);
    assert_eq!(guess.source, GuessSource::Fixed);
    assert!(FixedResolver::for_label("no-such-encoding").is_none());
}

fn discover_one(dir: &Path, ext: &str) -> codecollate::DiscoveredPath {
    let mut found = discover(dir, &rule(&[ext], &[], &[])).unwrap();
    assert_eq!(found.len(), 1);
    found.remove(0)
}

#[test]
fn test_read_utf8_round_trip() {
    let dir = tempdir().unwrap();
    let text = "fn main() {\n    println!(\"héllo wörld ✓\");\n}\n";
    fs::write(dir.path().join("main.rs"), text).unwrap();
    let record = read(&discover_one(dir.path(), ".rs"));
    assert_eq!(record.display_path, "main.rs");
    assert_eq!(record.content.as_deref(), Ok(text));
    assert_eq!(record.encoding, Some("UTF-8"));
    assert!(!record.lossy);
}

#[test]
fn test_read_gzip() {
    let dir = tempdir().unwrap();
    let text = "line one\nligne deux é\n";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    fs::write(dir.path().join("notes.txt.gz"), encoder.finish().unwrap()).unwrap();

    let record = read(&discover_one(dir.path(), ".gz"));
    assert_eq!(record.display_path, "notes.txt.gz");
    assert_eq!(record.content.as_deref(), Ok(text));
}

#[test]
fn test_read_gzip_replaces_invalid_sequences() {
    let dir = tempdir().unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"ok \xff end").unwrap();
    fs::write(dir.path().join("bad.log.gz"), encoder.finish().unwrap()).unwrap();

    let record = read(&discover_one(dir.path(), ".gz"));
    assert_eq!(record.content.as_deref(), Ok("ok \u{FFFD} end"));
    assert_eq!(record.encoding, Some("UTF-8"));
    assert!(record.lossy);
}

#[test]
fn test_read_corrupt_gzip_is_a_decode_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.gz"), "this is not gzip").unwrap();
    let record = read(&discover_one(dir.path(), ".gz"));
    let failure = record.content.unwrap_err();
    assert_eq!(failure.reason, ReadFailureReason::DecodeError);
}

#[test]
fn test_read_legacy_encoding() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("menu.txt"), b"caf\xe9 cr\xe8me").unwrap();
    let resolver = FixedResolver::new(WINDOWS_1252);
    let record = ContentReader::new(&OsFileSystem, &resolver).read(&discover_one(dir.path(), ".txt"));
    assert_eq!(record.content.as_deref(), Ok("café crème"));
    assert_eq!(record.encoding, Some("windows-1252"));
    assert!(!record.lossy);
}

#[test]
fn test_read_replaces_invalid_sequences() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.txt"), b"ok \xff end").unwrap();
    let resolver = FixedResolver::default();
    let record = ContentReader::new(&OsFileSystem, &resolver).read(&discover_one(dir.path(), ".txt"));
    assert_eq!(record.content.as_deref(), Ok("ok \u{FFFD} end"));
    assert!(record.lossy);
}

#[test]
fn test_read_utf16_with_bom() {
    let dir = tempdir().unwrap();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "hi ✓".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(dir.path().join("wide.txt"), bytes).unwrap();
    let record = read(&discover_one(dir.path(), ".txt"));
    assert_eq!(record.content.as_deref(), Ok("hi ✓"));
    assert_eq!(record.encoding, Some("UTF-16LE"));
}

#[test]
fn test_read_failure_is_data() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/locked.py", "print(1)");
    fs.deny("/proj/locked.py");
    let options = DiscoveryOptions {
        rule: rule(&[".py"], &[], &[]),
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    let record = ContentReader::new(&fs, &SniffingResolver).read(&found[0]);
    assert!(record.is_failure());
    assert_eq!(record.encoding, None);
    let failure = record.content.unwrap_err();
    assert_eq!(failure.reason, ReadFailureReason::IoError);
    assert!(failure.message.contains("permission denied"));
}

#[derive(Default)]
struct RecordingResolver {
    samples: Mutex<Vec<usize>>,
}

impl EncodingResolver for RecordingResolver {
    fn detect(&self, sample: &[u8]) -> EncodingGuess {
        self.samples.lock().unwrap().push(sample.len());
        FixedResolver::default().detect(sample)
    }
}

#[test]
fn test_resolver_sees_a_bounded_sample() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/long.txt", "x".repeat(100));
    let options = DiscoveryOptions {
        rule: rule(&[".txt"], &[], &[]),
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    let resolver = RecordingResolver::default();
    let record = ContentReader::new(&fs, &resolver)
        .sample_size(16)
        .read(&found[0]);
    assert_eq!(*resolver.samples.lock().unwrap(), vec![16]);
    assert_eq!(record.content.unwrap().len(), 100);
}

#[test]
fn test_huge_sample_size_reads_whole_file() {
    let fs = MemoryFileSystem::new();
    fs.add_file("/proj/small.txt", "just a few bytes");
    let options = DiscoveryOptions {
        rule: rule(&[".txt"], &[], &[]),
        ..Default::default()
    };
    let found = discover_with(&fs, Path::new("/proj"), &options).unwrap();
    let resolver = RecordingResolver::default();
    let record = ContentReader::new(&fs, &resolver)
        .sample_size(usize::MAX)
        .read(&found[0]);
    assert_eq!(*resolver.samples.lock().unwrap(), vec![16]);
    assert_eq!(record.content.as_deref(), Ok("just a few bytes"));
}

#[test]
fn test_assemble_block_format() {
    let mut out = Vec::new();
    let written = assemble(vec![FileRecord::new("a.py", "print(1)")], &mut out).unwrap();
    assert_eq!(written, 1);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Path: a.py\n====\nprint(1)\n-------------------------------------------------\n\n"
    );
}

#[test]
fn test_assemble_failure_block() {
    let failure = ReadFailure::io(&io::Error::new(
        io::ErrorKind::PermissionDenied,
        "permission denied",
    ));
    let mut out = Vec::new();
    assemble(vec![FileRecord::failed("locked.py", failure)], &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Path: locked.py\n=========\nError processing file: I/O error: permission denied\n\
         -------------------------------------------------\n\n"
    );
}

#[test]
fn test_assemble_headers_and_underlines() {
    let records = vec![
        FileRecord::new("a.py", "one"),
        FileRecord::new("src/dé.rs", "two\nlines"),
        FileRecord::new("deep/er/c.txt", ""),
    ];
    let mut out = Vec::new();
    assert_eq!(assemble(records, &mut out).unwrap(), 3);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let headers: Vec<usize> = (0..lines.len())
        .filter(|&i| lines[i].starts_with("Path: "))
        .collect();
    assert_eq!(headers.len(), 3);
    for i in headers {
        let path = &lines[i]["Path: ".len()..];
        assert_eq!(lines[i + 1], "=".repeat(path.chars().count()));
    }
    assert!(text.ends_with("-------------------------------------------------\n\n"));
}

struct FailingSink {
    written: Vec<u8>,
    limit: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.limit {
            return Err(io::Error::other("disk full"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_assemble_stops_at_first_write_error() {
    let mut sink = FailingSink {
        written: Vec::new(),
        limit: 70,
    };
    let records = vec![
        FileRecord::new("a.py", "print(1)"),
        FileRecord::new("b.py", "print(2)"),
    ];
    let err = assemble(records, &mut sink).unwrap_err();
    assert_eq!(err.io_error().to_string(), "disk full");
    let partial = String::from_utf8(sink.written).unwrap();
    assert!(partial.starts_with("Path: a.py\n"));
    assert!(!partial.contains("print(2)"));
}

#[test]
fn test_json_lines_output() {
    let failure = ReadFailure::decode("corrupt gzip stream");
    let records = vec![
        FileRecord::new("a.py", "print(1)\n"),
        FileRecord::failed("b.gz", failure),
    ];
    let mut out = Vec::new();
    write_summary(OutputFormat::JsonLines, records, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["path"], "a.py");
    assert_eq!(lines[0]["content"], "print(1)\n");
    assert!(lines[0]["error"].is_null());
    assert_eq!(lines[0]["lossy"], false);
    assert!(lines[1]["content"].is_null());
    assert_eq!(lines[1]["error"]["reason"], "decode_error");
    assert_eq!(OutputFormat::JsonLines.extension(), "jsonl");
}
