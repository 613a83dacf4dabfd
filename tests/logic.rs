//! Boolean reducers over a sequence.

use flowline::{Flux, StepVerifier, VerifyError};

fn animals() -> Flux<&'static str> {
    Flux::just(["aardvark", "elephant", "koala", "eagle", "kangaroo"])
}

#[test]
fn all_checks_every_value() -> Result<(), VerifyError> {
    StepVerifier::create(animals().all(|animal| animal.contains('a')))
        .expect_next(true)
        .verify_complete()?;
    StepVerifier::create(animals().all(|animal| animal.contains('r')))
        .expect_next(false)
        .verify_complete()?;
    Ok(())
}

#[test]
fn any_finds_a_match() -> Result<(), VerifyError> {
    StepVerifier::create(animals().any(|animal| animal.contains('r')))
        .expect_next(true)
        .verify_complete()?;
    StepVerifier::create(animals().any(|animal| animal.contains('z')))
        .expect_next(false)
        .verify_complete()?;
    Ok(())
}

#[test]
fn reducers_on_empty_sequences() -> Result<(), VerifyError> {
    StepVerifier::create(Flux::<&str>::empty().all(|_| false))
        .expect_next(true)
        .verify_complete()?;
    StepVerifier::create(Flux::<&str>::empty().any(|_| true))
        .expect_next(false)
        .verify_complete()?;
    Ok(())
}
