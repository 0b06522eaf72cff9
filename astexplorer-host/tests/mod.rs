use astexplorer_core::{
    EntryPointRegistry, ExplorerConfig, ExplorerEngine, InputOutcome, InvokeError, LoadError,
    LoadState, ModuleLoader, ParseError, ParserCapability, parse_with,
};
use astexplorer_host::wasm_host::unpack;
use astexplorer_host::{ArtifactSource, WasmHost, WasmModuleLoader};

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ENTRY: &str = "__CADENCE_PARSE__";

// Always answers with an empty program, whatever the input.
const FIXED_PROGRAM: &str = r#"
(module
  (memory (export "memory") 1)
  (data (i32.const 16) "{\"type\":\"Program\",\"declarations\":[]}")
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 68719476772)))
"#;

// Hands the input straight back.
const ECHO: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param $ptr i32) (param $len i32) (result i64)
    (i64.or
      (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
      (i64.extend_i32_u (local.get $len)))))
"#;

const ECHO_WITH_DEALLOC: &str = r#"
(module
  (memory (export "memory") 1)
  (global $freed (mut i32) (i32.const 0))
  (func (export "alloc") (param i32) (result i32) (i32.const 2048))
  (func (export "dealloc") (param i32 i32)
    (global.set $freed (i32.add (global.get $freed) (i32.const 1))))
  (func (export "__CADENCE_PARSE__") (param $ptr i32) (param $len i32) (result i64)
    (i64.or
      (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
      (i64.extend_i32_u (local.get $len)))))
"#;

// Holds at most one block: `alloc` traps until the previous one is freed.
// Input starting with `b` traps, input starting with `h` claims 4GiB of output.
const SINGLE_BLOCK: &str = r#"
(module
  (memory (export "memory") 1)
  (global $live (mut i32) (i32.const 0))
  (func (export "alloc") (param i32) (result i32)
    (if (global.get $live) (then unreachable))
    (global.set $live (i32.const 1))
    (i32.const 1024))
  (func (export "dealloc") (param i32 i32)
    (global.set $live (i32.const 0)))
  (func (export "__CADENCE_PARSE__") (param $ptr i32) (param $len i32) (result i64)
    (if (i32.eq (i32.load8_u (local.get $ptr)) (i32.const 98))
      (then unreachable))
    (if (i32.eq (i32.load8_u (local.get $ptr)) (i32.const 104))
      (then (return (i64.const 4294967295))))
    (i64.or
      (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
      (i64.extend_i32_u (local.get $len)))))
"#;

// Claims 0xFFFF_FFFF bytes of output at address 0.
const HUGE_OUTPUT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 4294967295)))
"#;

const NOT_JSON: &str = r#"
(module
  (memory (export "memory") 1)
  (data (i32.const 16) "not valid json")
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 68719476750)))
"#;

const NOT_UTF8: &str = r#"
(module
  (memory (export "memory") 1)
  (data (i32.const 16) "\ff\fe")
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 68719476738)))
"#;

// Points past the end of its single 64KiB page.
const OUT_OF_BOUNDS: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 562949953421412)))
"#;

const ENTRY_TRAPS: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    unreachable))
"#;

const NO_ENTRY: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32) (i32.const 1024)))
"#;

const NO_ALLOC: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 0)))
"#;

// Answers `true` only once its start routine has run.
const START_REGISTERS: &str = r#"
(module
  (memory (export "memory") 1)
  (data (i32.const 16) "true")
  (data (i32.const 32) "false")
  (global $started (mut i32) (i32.const 0))
  (func (export "_start") (global.set $started (i32.const 1)))
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (select
      (i64.const 68719476740)
      (i64.const 137438953477)
      (global.get $started))))
"#;

const START_TRAPS: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "_start") unreachable)
  (func (export "alloc") (param i32) (result i32) (i32.const 1024))
  (func (export "__CADENCE_PARSE__") (param i32 i32) (result i64)
    (i64.const 0)))
"#;

const NEEDS_IMPORTS: &str = r#"
(module
  (import "env" "log" (func (param i32)))
  (memory (export "memory") 1))
"#;

fn instantiate(wat: &str) -> Result<Arc<dyn ParserCapability>, LoadError> {
    let host = WasmHost::new().unwrap();
    host.instantiate(wat.as_bytes(), ENTRY)
        .map(|parser| Arc::new(parser) as Arc<dyn ParserCapability>)
}

fn write_artifact(dir: &Path, name: &str, wat: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, wat).unwrap();
    path
}

// ============================================================================
// WasmHost Tests
// ============================================================================

#[test]
fn test_wasm_host_creation() {
    let host = WasmHost::new();
    assert!(host.is_ok());
}

#[test]
fn test_wasm_host_debug() {
    let host = WasmHost::new().unwrap();
    let debug = format!("{:?}", host);
    assert!(debug.contains("WasmHost"));
}

#[test]
fn test_wasm_host_invalid_bytes() {
    let err = WasmHost::new()
        .unwrap()
        .instantiate(b"not valid wasm", ENTRY)
        .unwrap_err();
    assert!(matches!(err, LoadError::Instantiate(_)));
}

#[test]
fn test_wasm_host_empty_bytes() {
    let result = WasmHost::new().unwrap().instantiate(b"", ENTRY);
    assert!(result.is_err());
}

#[test]
fn test_wasm_host_minimal_module_lacks_exports() {
    // Minimal valid WASM module (magic + version + empty)
    let minimal_wasm = [
        0x00, 0x61, 0x73, 0x6D, // magic: \0asm
        0x01, 0x00, 0x00, 0x00, // version: 1
    ];
    let err = WasmHost::new()
        .unwrap()
        .instantiate(&minimal_wasm, ENTRY)
        .unwrap_err();
    assert_eq!(
        err,
        LoadError::MissingExport {
            name: "memory".to_string()
        }
    );
}

#[test]
fn test_wasm_host_missing_entry_point() {
    let err = instantiate(NO_ENTRY).unwrap_err();
    assert_eq!(
        err,
        LoadError::MissingExport {
            name: ENTRY.to_string()
        }
    );
}

#[test]
fn test_wasm_host_missing_alloc() {
    let err = instantiate(NO_ALLOC).unwrap_err();
    assert_eq!(
        err,
        LoadError::MissingExport {
            name: "alloc".to_string()
        }
    );
}

#[test]
fn test_wasm_host_unsatisfied_imports() {
    let err = instantiate(NEEDS_IMPORTS).unwrap_err();
    assert!(matches!(err, LoadError::Instantiate(_)));
}

#[test]
fn test_wasm_host_runs_start_routine() {
    let parser = instantiate(START_REGISTERS).unwrap();
    assert_eq!(parser.parse_raw("").unwrap(), "true");
}

#[test]
fn test_wasm_host_trapping_start_fails_load() {
    let err = instantiate(START_TRAPS).unwrap_err();
    match err {
        LoadError::Instantiate(msg) => assert!(msg.contains("_start")),
        other => panic!("Expected Instantiate, got {:?}", other),
    }
}

#[test]
fn test_wasm_parser_debug_names_entry_point() {
    let host = WasmHost::new().unwrap();
    let parser = host.instantiate(ECHO.as_bytes(), ENTRY).unwrap();
    assert_eq!(parser.entry_point(), ENTRY);
    assert!(format!("{:?}", parser).contains(ENTRY));
}

#[test]
fn test_unpack_splits_pointer_and_length() {
    assert_eq!(unpack(68719476772), (16, 36));
    assert_eq!(unpack(0), (0, 0));
    assert_eq!(unpack(-1), (0xFFFF_FFFF, 0xFFFF_FFFF));
}

// ============================================================================
// WasmParser Invocation Tests
// ============================================================================

#[test]
fn test_wasm_parser_fixed_program() {
    let parser = instantiate(FIXED_PROGRAM).unwrap();
    let result = parse_with(parser.as_ref(), "").unwrap();
    assert_eq!(result.into_value(), json!({ "type": "Program", "declarations": [] }));
}

#[test]
fn test_wasm_parser_echo_is_pass_through() {
    let parser = instantiate(ECHO).unwrap();
    for text in [r#"{"type":"Program","declarations":[{"kind":"fun"}]}"#, "[]", r#""ünïcødé""#] {
        assert_eq!(parser.parse_raw(text).unwrap(), text);
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(*parse_with(parser.as_ref(), text).unwrap(), expected);
    }
}

#[test]
fn test_wasm_parser_repeated_calls() {
    let parser = instantiate(ECHO_WITH_DEALLOC).unwrap();
    for n in 0..50 {
        let text = format!("[{}]", n);
        assert_eq!(parser.parse_raw(&text).unwrap(), text);
    }
}

#[test]
fn test_wasm_parser_empty_source() {
    let parser = instantiate(ECHO).unwrap();
    assert_eq!(parser.parse_raw("").unwrap(), "");
}

#[test]
fn test_wasm_parser_not_json_is_format_error() {
    let parser = instantiate(NOT_JSON).unwrap();
    assert_eq!(parser.parse_raw("x").unwrap(), "not valid json");
    let err = parse_with(parser.as_ref(), "x").unwrap_err();
    assert!(matches!(err, ParseError::Malformed(_)));
}

#[test]
fn test_wasm_parser_non_utf8_output() {
    let parser = instantiate(NOT_UTF8).unwrap();
    assert_eq!(parser.parse_raw("x").unwrap_err(), InvokeError::InvalidUtf8);
}

#[test]
fn test_wasm_parser_out_of_bounds_output() {
    let parser = instantiate(OUT_OF_BOUNDS).unwrap();
    assert!(matches!(parser.parse_raw("x").unwrap_err(), InvokeError::Memory(_)));
}

#[test]
fn test_wasm_parser_huge_output_length_is_memory_error() {
    let parser = instantiate(HUGE_OUTPUT).unwrap();
    match parser.parse_raw("x").unwrap_err() {
        InvokeError::Memory(reason) => assert!(reason.contains("4294967295")),
        other => panic!("Expected Memory, got {:?}", other),
    }
}

#[test]
fn test_wasm_parser_frees_input_when_call_fails() {
    let parser = instantiate(SINGLE_BLOCK).unwrap();

    assert!(matches!(parser.parse_raw("boom").unwrap_err(), InvokeError::Trap(_)));
    assert!(matches!(parser.parse_raw("huge").unwrap_err(), InvokeError::Memory(_)));

    // A leaked block would make this `alloc` trap.
    assert_eq!(parser.parse_raw("[1]").unwrap(), "[1]");
    assert_eq!(parser.parse_raw("[2]").unwrap(), "[2]");
}

#[test]
fn test_wasm_parser_trap_is_invocation_error() {
    let parser = instantiate(ENTRY_TRAPS).unwrap();
    let err = parse_with(parser.as_ref(), "x").unwrap_err();
    assert!(matches!(err, ParseError::Invocation(InvokeError::Trap(_))));
}

// ============================================================================
// ArtifactSource Tests
// ============================================================================

#[test]
fn test_artifact_relative_path_resolves_against_base() {
    let source = ArtifactSource::from_location("./main.wasm", Path::new("/srv/explorer"));
    assert_eq!(
        source,
        ArtifactSource::File(PathBuf::from("/srv/explorer").join("./main.wasm"))
    );
}

#[test]
fn test_artifact_absolute_path_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let absolute = dir.path().join("parser.wasm");
    let source = ArtifactSource::from_location(absolute.to_str().unwrap(), Path::new("/elsewhere"));
    assert_eq!(source, ArtifactSource::File(absolute));
}

#[test]
fn test_artifact_url_detection() {
    let source = ArtifactSource::from_location(" HTTPS://example.com/main.wasm ", Path::new("."));
    assert_eq!(
        source,
        ArtifactSource::Url("HTTPS://example.com/main.wasm".to_string())
    );
    assert_eq!(source.to_string(), "HTTPS://example.com/main.wasm");
}

#[tokio::test]
async fn test_artifact_missing_file_is_fetch_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = ArtifactSource::from_location("missing.wasm", dir.path());
    match source.fetch().await.unwrap_err() {
        LoadError::Fetch { location, .. } => assert!(location.ends_with("missing.wasm")),
        other => panic!("Expected Fetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_artifact_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), "main.wasm", FIXED_PROGRAM);
    let bytes = ArtifactSource::from_location("main.wasm", dir.path())
        .fetch()
        .await
        .unwrap();
    assert_eq!(bytes, FIXED_PROGRAM.as_bytes());
}

/// Answers each request with the next `(status line, body)` pair.
async fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    format!("http://{}/main.wasm", addr)
}

#[tokio::test]
async fn test_artifact_url_fetch() {
    let url = serve(vec![("404 Not Found", "gone"), ("200 OK", FIXED_PROGRAM)]).await;
    let source = ArtifactSource::from_location(&url, Path::new("."));
    assert_eq!(source, ArtifactSource::Url(url.clone()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    match source.fetch_with(&client).await.unwrap_err() {
        LoadError::Fetch { location, reason } => {
            assert_eq!(location, url);
            assert!(reason.contains("404"), "reason was {:?}", reason);
        }
        other => panic!("Expected Fetch, got {:?}", other),
    }

    let bytes = source.fetch_with(&client).await.unwrap();
    assert_eq!(bytes, FIXED_PROGRAM.as_bytes());

    let parser = WasmHost::new().unwrap().instantiate(&bytes, ENTRY).unwrap();
    assert!(parse_with(&parser, "").is_ok());
}

// ============================================================================
// WasmModuleLoader Tests
// ============================================================================

#[tokio::test]
async fn test_loader_loads_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), "main.wasm", FIXED_PROGRAM);

    let loader = WasmModuleLoader::from_config(&ExplorerConfig::default(), dir.path()).unwrap();
    let parser = loader.load().await.unwrap();
    let result = parse_with(parser.as_ref(), "").unwrap();
    assert_eq!(result["type"], "Program");
}

#[tokio::test]
async fn test_loader_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let loader = WasmModuleLoader::from_config(&ExplorerConfig::default(), dir.path()).unwrap();
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, LoadError::Fetch { .. }));
}

#[tokio::test]
async fn test_loader_custom_entry_point() {
    let dir = tempfile::tempdir().unwrap();
    let wat = ECHO.replace(ENTRY, "parse");
    write_artifact(dir.path(), "echo.wasm", &wat);

    let config = ExplorerConfig {
        artifact: "echo.wasm".to_string(),
        entry_point: "parse".to_string(),
        ..ExplorerConfig::default()
    };
    let loader = WasmModuleLoader::from_config(&config, dir.path()).unwrap();
    let parser = loader.load().await.unwrap();
    assert_eq!(parser.parse_raw("[1]").unwrap(), "[1]");
}

#[tokio::test]
async fn test_load_parser_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), "main.wasm", FIXED_PROGRAM);

    let invoker = astexplorer_host::load_parser(&ExplorerConfig::default(), dir.path())
        .await
        .unwrap();
    assert!(invoker.registry().is_registered(ENTRY));
    assert_eq!(
        invoker.parse("").unwrap().render(4),
        "{\n    \"type\": \"Program\",\n    \"declarations\": []\n}"
    );
}

#[tokio::test]
async fn test_load_parser_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let err = astexplorer_host::load_parser(&ExplorerConfig::default(), dir.path())
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("main.wasm"));
}

#[tokio::test]
async fn test_engine_boots_with_wasm_loader() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), "main.wasm", ECHO);

    let config = ExplorerConfig::default();
    let loader = WasmModuleLoader::from_config(&config, dir.path()).unwrap();
    let mut engine = ExplorerEngine::new(&config, Arc::new(EntryPointRegistry::new()));

    engine.boot(&loader).await.unwrap();
    assert_eq!(*engine.state(), LoadState::Ready);

    assert!(matches!(engine.on_input(r#"{"a":[1,2]}"#), InputOutcome::Rendered));
    let back: Value = serde_json::from_str(engine.output()).unwrap();
    assert_eq!(back, json!({ "a": [1, 2] }));
}

#[tokio::test]
async fn test_engine_failed_wasm_load() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), "main.wasm", NO_ENTRY);

    let config = ExplorerConfig::default();
    let loader = WasmModuleLoader::from_config(&config, dir.path()).unwrap();
    let mut engine = ExplorerEngine::new(&config, Arc::new(EntryPointRegistry::new()));

    engine.boot(&loader).await.unwrap();
    assert!(matches!(engine.state(), LoadState::Failed(reason) if reason.contains(ENTRY)));
    assert!(matches!(engine.on_input("[]"), InputOutcome::NotReady));
}
