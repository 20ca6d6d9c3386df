//! End-to-end tests: table files on disk through to corrected samples.

use num_complex::Complex64;
use satdop_core::prelude::*;
use std::f64::consts::PI;
use std::io::Write;
use std::path::PathBuf;

fn write_table(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_ramp_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(&dir, "ramp.txt", "0.0 0.0\n1.0 10.0\n");

    let mut corrector = DopplerCorrector::from_file(&path, 1000.0, 0.0).unwrap();
    let input = vec![Complex64::new(1.0, 0.0); 1000];
    let output = corrector.process(&input, &[]);

    assert_eq!(output.len(), 1000);
    assert_eq!(output[0], input[0]);
    for y in &output {
        assert!((y.norm() - 1.0).abs() < 1e-12);
    }

    // Total rotation is the sum of the interpolated increments.
    let expected: f64 = (0..1000).map(|j| 2.0 * PI * 10.0 * j as f64 / 1e6).sum();
    let got = output[999].arg();
    let diff = (got + expected).rem_euclid(2.0 * PI);
    assert!(diff < 1e-9 || (2.0 * PI - diff) < 1e-9);
}

#[test]
fn test_malformed_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(&dir, "bad.txt", "abc def\n");
    let err = DopplerCorrector::from_file(&path, 1000.0, 0.0).unwrap_err();
    assert!(matches!(err, DopplerError::Format { record: 1, .. }));
}

#[test]
fn test_empty_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(&dir, "empty.txt", "");
    let err = DopplerCorrector::from_file(&path, 1000.0, 0.0).unwrap_err();
    assert!(matches!(err, DopplerError::EmptyTable));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DopplerCorrector::from_file(dir.path().join("nope.txt"), 1000.0, 0.0).unwrap_err();
    assert!(matches!(err, DopplerError::Io(_)));
}

#[test]
fn test_negative_sample_rate_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let err = DopplerCorrector::from_file(dir.path().join("nope.txt"), -1.0, 0.0).unwrap_err();
    assert!(matches!(err, DopplerError::InvalidConfiguration(_)));
}

#[test]
fn test_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write_table(&dir, "pass.txt", "100 500\n200 -500\n");
    let config_path = dir.path().join("corrector.json");
    std::fs::write(
        &config_path,
        r#"{ "table": "pass.txt", "sample_rate": 2000.0, "t0": 150.0 }"#,
    )
    .unwrap();

    let config = CorrectorConfig::from_json_file(&config_path).unwrap();
    let mut corrector = DopplerCorrector::from_config(&config).unwrap();
    assert_eq!(corrector.table().len(), 2);

    // t = 150 s is mid-table: 0 Hz, so the first sample passes unchanged.
    let out = corrector.process(&[Complex64::new(0.25, -0.75)], &[]);
    assert!((out[0] - Complex64::new(0.25, -0.75)).norm() < 1e-12);
}

#[test]
fn test_long_stream_stays_on_unit_circle() {
    // A fast-moving pass, chunked like a live receiver would deliver it.
    let fs = 250_000.0;
    let table = DopplerTable::from_entries(&[(0.0, -48_000.0), (8.0, 48_000.0)], fs).unwrap();
    let mut corrector = DopplerCorrector::new(table, fs, 0.0).unwrap();

    let block = vec![Complex64::new(1.0, 0.0); 8192];
    for _ in 0..250 {
        let out = corrector.process(&block, &[]);
        assert!(corrector.phase().abs() <= PI);
        let worst = out
            .iter()
            .map(|y| (y.norm() - 1.0).abs())
            .fold(0.0, f64::max);
        assert!(worst < 1e-12, "magnitude drift {worst}");
    }
    assert_eq!(corrector.samples_processed(), 250 * 8192);
}

#[test]
fn test_iq_file_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let table_path = write_table(&dir, "pass.txt", "0 250\n");
    let in_path = dir.path().join("in.cf32");
    let out_path = dir.path().join("out.cf32");

    // A 250 Hz tone at 8 kHz.
    let fs = 8000.0;
    let tone: Vec<Complex64> = (1..=4000)
        .map(|n| Complex64::cis(2.0 * PI * 250.0 * n as f64 / fs))
        .collect();
    let mut writer = IqWriter::auto(&in_path).unwrap();
    writer.write(&tone).unwrap();
    writer.close().unwrap();

    let mut corrector = DopplerCorrector::from_file(&table_path, fs, 0.0).unwrap();
    let mut reader = IqReader::auto(&in_path).unwrap();
    let mut writer = IqWriter::auto(&out_path).unwrap();
    loop {
        let block = reader.read(1000).unwrap();
        if block.is_empty() {
            break;
        }
        writer.write(&corrector.process(&block, &[])).unwrap();
    }
    writer.close().unwrap();

    let corrected = IqReader::auto(&out_path).unwrap().read(10_000).unwrap();
    assert_eq!(corrected.len(), 4000);
    for y in corrected {
        assert!((y - Complex64::new(1.0, 0.0)).norm() < 1e-4);
    }
}
