use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ReelError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        ReelError::filesystem("x")
            .to_string()
            .contains("filesystem error:")
    );
    assert!(ReelError::timeout("x").to_string().contains("timeout:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), FailureKind::Internal);
}

#[test]
fn kinds_follow_variants() {
    assert_eq!(
        ReelError::validation("x").kind(),
        FailureKind::InputValidation
    );
    assert_eq!(ReelError::encode("x").kind(), FailureKind::Encode);
    assert_eq!(ReelError::cancelled("x").kind(), FailureKind::Cancelled);
}

#[test]
fn failure_kind_serializes_snake_case() {
    let s = serde_json::to_string(&FailureKind::InputValidation).unwrap();
    assert_eq!(s, "\"input_validation\"");
}
