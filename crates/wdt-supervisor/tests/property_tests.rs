//! Property-based tests for timeout policy and failure escalation.

#![cfg(test)]

use proptest::prelude::*;
use std::time::Duration;
use watchdogdev::prelude::*;
use wdt_supervisor::prelude::*;

fn run_until_cycle_limit(
    script: &[bool],
    cycles: u64,
) -> (SupervisorResult<RunReport>, DeviceJournal) {
    let device = SoftwareWatchdog::builder()
        .keep_alive_failures(script.iter().copied())
        .build();
    let journal = device.journal();
    let config = SupervisorConfig {
        max_cycles: Some(cycles),
        ..SupervisorConfig::default()
    };
    let mut supervisor = Supervisor::with_pacer(config, |_: Duration| {});
    (supervisor.run_with(|_| Ok(device)), journal)
}

fn longest_failure_run(script: &[bool]) -> usize {
    script
        .split(|failed| !*failed)
        .map(<[bool]>::len)
        .max()
        .unwrap_or(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_timeouts_below_minimum_clamp_to_ten(requested in 0u32..MIN_TIMEOUT_SECS) {
        let timeout = TimeoutConfig::new(Some(requested));
        prop_assert_eq!(timeout.timeout_secs(), Some(10));
        prop_assert_eq!(timeout.keep_alive_interval(), Duration::from_secs(1));
    }

    #[test]
    fn prop_interval_is_tenth_of_timeout(requested in MIN_TIMEOUT_SECS..=u32::MAX) {
        let timeout = TimeoutConfig::new(Some(requested));
        prop_assert_eq!(timeout.timeout_secs(), Some(requested));
        prop_assert_eq!(
            timeout.keep_alive_interval(),
            Duration::from_secs(u64::from((requested / 10).max(1)))
        );
    }

    #[test]
    fn prop_interval_never_below_one_second(requested in proptest::option::of(any::<u32>())) {
        let timeout = TimeoutConfig::new(requested);
        prop_assert!(timeout.keep_alive_interval() >= Duration::from_secs(1));
    }

    #[test]
    fn prop_watchdog_lost_iff_three_consecutive_failures(
        script in proptest::collection::vec(any::<bool>(), 1..16),
    ) {
        let cycles = script.len() as u64;
        let (result, journal) = run_until_cycle_limit(&script, cycles);

        if longest_failure_run(&script) >= 3 {
            let is_lost = matches!(result, Err(SupervisorError::WatchdogLost { failures: 3, .. }));
            prop_assert!(is_lost);
        } else {
            let report = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(report.cycles, cycles);
            prop_assert_eq!(report.stop_reason, StopReason::CycleLimitReached);
        }
        prop_assert_eq!(journal.count(DeviceCall::Close), 1);
    }

    #[test]
    fn prop_magic_close_iff_option_set(bits in any::<u32>()) {
        let options = WatchdogOptions::from_bits_retain(bits);
        let device = SoftwareWatchdog::builder().options(options).build();
        let journal = device.journal();
        let mut supervisor = Supervisor::with_pacer(
            SupervisorConfig { max_cycles: Some(1), ..SupervisorConfig::default() },
            |_: Duration| {},
        );

        let report = supervisor
            .run_with(|_| Ok(device))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let expected = usize::from(options.contains(WatchdogOptions::MAGICCLOSE));
        prop_assert_eq!(journal.count(DeviceCall::MagicClose), expected);
        prop_assert_eq!(
            report.magic_close == MagicCloseOutcome::Performed,
            expected == 1
        );
        prop_assert_eq!(journal.count(DeviceCall::Close), 1);
    }
}
