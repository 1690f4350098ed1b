use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{Duration, Instant};

use server::config::AppConfig;
use server::middleware::{RateLimiter, PRUNE_THRESHOLD};

const WINDOW: Duration = Duration::from_secs(60);

fn staff_terminal() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))
}

fn client(n: usize) -> IpAddr {
    IpAddr::V6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, (n >> 16) as u16, n as u16))
}

#[test]
fn test_limit_counts_attempts_inside_window() {
    let limiter = RateLimiter::with_limit(3, WINDOW);
    let t0 = Instant::now();

    assert!(limiter.check_at(staff_terminal(), t0));
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(10)));
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(20)));
    assert!(!limiter.check_at(staff_terminal(), t0 + Duration::from_secs(30)));
}

#[test]
fn test_window_slides_per_attempt() {
    let limiter = RateLimiter::with_limit(2, WINDOW);
    let t0 = Instant::now();

    assert!(limiter.check_at(staff_terminal(), t0));
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(40)));

    // Only the first attempt has aged out.
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(61)));
    assert!(!limiter.check_at(staff_terminal(), t0 + Duration::from_secs(62)));

    // The attempt at 40s leaves at 100s.
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(101)));
}

#[test]
fn test_rejected_attempts_do_not_extend_lockout() {
    let limiter = RateLimiter::with_limit(1, WINDOW);
    let t0 = Instant::now();

    assert!(limiter.check_at(staff_terminal(), t0));
    for secs in [5, 30, 55] {
        assert!(!limiter.check_at(staff_terminal(), t0 + Duration::from_secs(secs)));
    }
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(61)));
}

#[test]
fn test_exhausted_client_does_not_block_others() {
    let limiter = RateLimiter::with_limit(1, WINDOW);
    let t0 = Instant::now();

    assert!(limiter.check_at(staff_terminal(), t0));
    assert!(!limiter.check_at(staff_terminal(), t0));
    assert!(limiter.check_at(client(1), t0));
    assert_eq!(limiter.tracked_clients(), 2);
}

#[test]
fn test_idle_clients_are_pruned_past_threshold() {
    let limiter = RateLimiter::with_limit(5, WINDOW);
    let t0 = Instant::now();

    for n in 0..=PRUNE_THRESHOLD {
        assert!(limiter.check_at(client(n), t0));
    }
    assert_eq!(limiter.tracked_clients(), PRUNE_THRESHOLD + 1);

    // Every earlier client is idle by now; the next check sweeps them.
    limiter.check_at(staff_terminal(), t0 + WINDOW + Duration::from_secs(1));
    assert_eq!(limiter.tracked_clients(), 1);
}

#[test]
fn test_no_pruning_at_or_below_threshold() {
    let limiter = RateLimiter::with_limit(5, WINDOW);
    let t0 = Instant::now();

    for n in 0..PRUNE_THRESHOLD {
        limiter.check_at(client(n), t0);
    }

    limiter.check_at(staff_terminal(), t0 + WINDOW * 2);
    assert_eq!(limiter.tracked_clients(), PRUNE_THRESHOLD + 1);
}

#[test]
fn test_cleanup_keeps_clients_with_recent_attempts() {
    let limiter = RateLimiter::with_limit(5, WINDOW);
    limiter.check_rate_limit(staff_terminal());

    limiter.cleanup_old_entries();
    assert_eq!(limiter.tracked_clients(), 1);
}

#[test]
fn test_limiter_from_config() {
    let config = AppConfig::from_toml_str(
        "login_rate_limit = 2\nlogin_rate_window_secs = 5",
    )
    .expect("config");
    let limiter = config.login_rate_limiter();
    let t0 = Instant::now();

    assert!(limiter.check_at(staff_terminal(), t0));
    assert!(limiter.check_at(staff_terminal(), t0));
    assert!(!limiter.check_at(staff_terminal(), t0 + Duration::from_secs(4)));
    assert!(limiter.check_at(staff_terminal(), t0 + Duration::from_secs(6)));
}
