use super::*;

#[test]
fn clones_share_the_flag() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(token.check("capture").is_ok());

    other.cancel();
    assert!(token.is_cancelled());
    let err = token.check("capture").unwrap_err();
    assert!(matches!(err, ReelError::Cancelled(_)));
    assert!(err.to_string().contains("capture"));
}
