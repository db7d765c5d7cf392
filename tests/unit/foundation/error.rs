use super::*;

#[test]
fn display_messages_distinguish_remediation_paths() {
    assert!(FlipbookError::EmptyInput.to_string().contains("no input"));
    assert!(
        FlipbookError::invalid_dimension("width is 0")
            .to_string()
            .contains("invalid dimension:")
    );
    assert!(
        FlipbookError::resource_exhausted("allocation of 4 GiB failed")
            .to_string()
            .contains("reduce the frame count")
    );
    assert!(
        FlipbookError::Cancelled
            .to_string()
            .contains("cancelled")
    );
}

#[test]
fn palette_too_large_reports_count() {
    let err = FlipbookError::PaletteTooLarge(300);
    assert!(err.to_string().contains("300"));
    assert!(err.to_string().contains("256"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FlipbookError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
