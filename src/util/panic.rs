/// Asserts that running the block panics.
#[allow(unused_macros)]
macro_rules! assert_panics {
    ($run:block) => {
        assert_panics!($run, "assertion failed to panic")
    };
    ($run:block, $msg:literal) => {
        assert!(
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $run)).is_err(),
            $msg
        );
        println!("^ panic caught");
    };
}

#[allow(unused_imports)]
pub(crate) use assert_panics;

/// Asserts an invariant which is too expensive to check outside of the `pedantic` feature.
macro_rules! pedantic_assert {
    ($($arg:tt)*) => {
        if cfg!(feature = "pedantic") {
            assert!($($arg)*);
        }
    };
}

pub(crate) use pedantic_assert;
