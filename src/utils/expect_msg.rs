/// Unwraps a value whose absence is a programming error, panicking with `msg`
/// and the underlying cause.
pub trait ExpectMsg<T> {
    fn expect_msg(self, msg: &str) -> T;
}

impl<T, E: std::fmt::Display> ExpectMsg<T> for Result<T, E> {
    fn expect_msg(self, msg: &str) -> T {
        match self {
            Ok(val) => val,
            Err(err) => panic!("{}: {}", msg, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_ok_through() {
        let res: Result<u8, String> = Ok(7);
        assert_eq!(res.expect_msg("unreachable"), 7);
    }

    #[test]
    #[should_panic(expected = "Failed to map: boom")]
    fn panics_with_message_and_cause() {
        let res: Result<u8, String> = Err("boom".to_string());
        res.expect_msg("Failed to map");
    }
}
