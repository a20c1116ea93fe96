//! Bounded retry for row-lock acquisition.
//!
//! The lock is a serialisation hint, not a correctness guarantee: when every
//! attempt is contended the caller still goes ahead with its write.

use std::{future::Future, pin::Pin, time::Duration};

/// One lock attempt against a borrowed connection or transaction.
pub type AttemptFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// How many times to try for a row lock, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  attempts: u32,
  backoff:  Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self::new(3, Duration::from_millis(100)) }
}

/// Result of [`RetryPolicy::run_blocking`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt<T> {
  Acquired(T),
  /// Every attempt hit contention.
  Exhausted,
}

impl<T> LockAttempt<T> {
  pub fn is_acquired(&self) -> bool { matches!(self, Self::Acquired(_)) }
}

impl RetryPolicy {
  /// `attempts` is clamped to at least one.
  pub fn new(attempts: u32, backoff: Duration) -> Self {
    Self { attempts: attempts.max(1), backoff }
  }

  /// No pause between attempts.
  pub fn immediate(attempts: u32) -> Self { Self::new(attempts, Duration::ZERO) }

  pub fn attempts(&self) -> u32 { self.attempts }

  pub fn backoff(&self) -> Duration { self.backoff }

  /// Run `op` until it succeeds, fails with a non-contention error, or the
  /// attempts run out. `op` receives the 1-based attempt number.
  ///
  /// Sleeps the current thread between contended attempts, never after the
  /// last one.
  pub fn run_blocking<T, E>(
    &self,
    mut op: impl FnMut(u32) -> Result<T, E>,
    is_contention: impl Fn(&E) -> bool,
  ) -> Result<LockAttempt<T>, E> {
    for attempt in 1..=self.attempts {
      match op(attempt) {
        Ok(value) => return Ok(LockAttempt::Acquired(value)),
        Err(e) if is_contention(&e) => {
          tracing::warn!(attempt, attempts = self.attempts, "row lock contended");
          if attempt < self.attempts && !self.backoff.is_zero() {
            std::thread::sleep(self.backoff);
          }
        }
        Err(e) => return Err(e),
      }
    }
    Ok(LockAttempt::Exhausted)
  }

  /// Async form of [`run_blocking`](Self::run_blocking).
  ///
  /// `op` gets `ctx` back on every attempt, so an attempt can borrow a
  /// transaction that outlives the loop. Pauses suspend only the calling
  /// task.
  pub async fn run<C, T, E>(
    &self,
    ctx: &mut C,
    mut op: impl for<'c> FnMut(&'c mut C, u32) -> AttemptFuture<'c, T, E>,
    is_contention: impl Fn(&E) -> bool,
  ) -> Result<LockAttempt<T>, E> {
    for attempt in 1..=self.attempts {
      match op(ctx, attempt).await {
        Ok(value) => return Ok(LockAttempt::Acquired(value)),
        Err(e) if is_contention(&e) => {
          tracing::warn!(attempt, attempts = self.attempts, "row lock contended");
          if attempt < self.attempts {
            self.pause().await;
          }
        }
        Err(e) => return Err(e),
      }
    }
    Ok(LockAttempt::Exhausted)
  }

  /// Async pause between attempts; suspends only the calling task.
  pub async fn pause(&self) {
    if !self.backoff.is_zero() {
      tokio::time::sleep(self.backoff).await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  enum Failure {
    Busy,
    Broken,
  }

  fn is_busy(e: &Failure) -> bool { matches!(e, Failure::Busy) }

  #[test]
  fn succeeds_on_third_attempt() {
    let mut calls = 0;
    let result = RetryPolicy::immediate(3).run_blocking(
      |attempt| {
        calls += 1;
        if attempt < 3 { Err(Failure::Busy) } else { Ok(attempt) }
      },
      is_busy,
    );
    assert_eq!(result, Ok(LockAttempt::Acquired(3)));
    assert_eq!(calls, 3);
  }

  #[test]
  fn exhaustion_is_not_an_error() {
    let mut calls = 0;
    let result: Result<LockAttempt<()>, _> = RetryPolicy::immediate(3).run_blocking(
      |_| {
        calls += 1;
        Err(Failure::Busy)
      },
      is_busy,
    );
    assert_eq!(result, Ok(LockAttempt::Exhausted));
    assert_eq!(calls, 3);
  }

  #[test]
  fn other_errors_stop_immediately() {
    let mut calls = 0;
    let result: Result<LockAttempt<()>, _> = RetryPolicy::immediate(3).run_blocking(
      |_| {
        calls += 1;
        Err(Failure::Broken)
      },
      is_busy,
    );
    assert_eq!(result, Err(Failure::Broken));
    assert_eq!(calls, 1);
  }

  /// Fails with each scripted error in turn, then succeeds.
  fn scripted(
    script: &mut Vec<Failure>,
    attempt: u32,
  ) -> AttemptFuture<'_, u32, Failure> {
    Box::pin(async move {
      match script.pop() {
        Some(failure) => Err(failure),
        None => Ok(attempt),
      }
    })
  }

  #[tokio::test]
  async fn async_succeeds_on_third_attempt() {
    let mut script = vec![Failure::Busy, Failure::Busy];
    let result = RetryPolicy::immediate(3).run(&mut script, scripted, is_busy).await;
    assert_eq!(result, Ok(LockAttempt::Acquired(3)));
    assert!(script.is_empty());
  }

  #[tokio::test]
  async fn async_exhaustion_is_not_an_error() {
    let mut script = vec![Failure::Busy; 5];
    let result = RetryPolicy::immediate(3).run(&mut script, scripted, is_busy).await;
    assert_eq!(result, Ok(LockAttempt::Exhausted));
    assert_eq!(script.len(), 2);
  }

  #[tokio::test]
  async fn async_other_errors_stop_immediately() {
    let mut script = vec![Failure::Busy, Failure::Broken];
    let result = RetryPolicy::immediate(3).run(&mut script, scripted, is_busy).await;
    assert_eq!(result, Err(Failure::Broken));
    assert_eq!(script, vec![Failure::Busy]);
  }

  #[tokio::test]
  async fn async_pauses_between_attempts() {
    let mut script = vec![Failure::Busy; 3];
    let started = std::time::Instant::now();
    let result = RetryPolicy::new(3, Duration::from_millis(100))
      .run(&mut script, scripted, is_busy)
      .await;
    assert_eq!(result, Ok(LockAttempt::Exhausted));
    assert!(started.elapsed() >= Duration::from_millis(200));
  }

  #[test]
  fn zero_attempts_still_tries_once() {
    let policy = RetryPolicy::immediate(0);
    assert_eq!(policy.attempts(), 1);
  }

  #[test]
  fn no_pause_after_last_attempt() {
    let policy = RetryPolicy::new(1, Duration::from_secs(2));
    let started = std::time::Instant::now();
    let result: Result<LockAttempt<()>, _> =
      policy.run_blocking(|_| Err(Failure::Busy), is_busy);
    assert_eq!(result, Ok(LockAttempt::Exhausted));
    assert!(started.elapsed() < Duration::from_secs(1));
  }
}
