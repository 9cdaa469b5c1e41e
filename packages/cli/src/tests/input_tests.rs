// ABOUTME: Tests for reading requirement text, images, and saved analyses
// ABOUTME: Covers argument, file, and stdin precedence plus output writing

use crate::error::CliError;
use crate::input::{load_analysis, read_image, read_text, write_output};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use uieasy_analyzer::{structure_response, AnalysisRequest, Platform};

#[test]
fn test_read_text_prefers_argument() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("requirements.txt");
    fs::write(&path, "from file").unwrap();

    let text = read_text(Some("from argument"), Some(&path)).unwrap();
    assert_eq!(text, "from argument");
}

#[test]
fn test_read_text_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("requirements.txt");
    fs::write(&path, "用户登录,创建任务,任务列表").unwrap();

    let text = read_text(None, Some(&path)).unwrap();
    assert_eq!(text, "用户登录,创建任务,任务列表");
}

#[test]
fn test_read_text_rejects_blank() {
    let err = read_text(Some("   \n"), None).unwrap_err();
    assert!(matches!(err, CliError::EmptyInput));
}

#[test]
fn test_read_text_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = read_text(None, Some(&dir.path().join("absent.txt"))).unwrap_err();
    assert!(matches!(err, CliError::Read { .. }));
}

#[test]
fn test_read_image_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mockup.png");
    fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

    assert_eq!(read_image(&path).unwrap(), vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_saved_analysis_round_trip() {
    let analysis = structure_response(
        r#"[{"title": "Login", "description": "Users sign in with email"}]"#,
        &AnalysisRequest::new("login", Platform::Mobile),
    );
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analysis.json");
    write_output(&serde_json::to_string_pretty(&analysis).unwrap(), Some(&path)).unwrap();

    let loaded = load_analysis(&path).unwrap();
    assert_eq!(loaded, analysis);
}

#[test]
fn test_load_analysis_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analysis.json");
    fs::write(&path, "[1, 2").unwrap();

    let err = load_analysis(&path).unwrap_err();
    assert!(matches!(err, CliError::InvalidAnalysis { .. }));
}
