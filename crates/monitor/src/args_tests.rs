// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parse(extra: &[&str]) -> MonitorArgs {
    let mut argv = vec!["mcjob-monitor", "-l", "mcuser", "-w", "/jobs/tester/plan/run.1"];
    argv.extend_from_slice(extra);
    MonitorArgs::try_parse_from(argv).unwrap()
}

#[test]
fn parses_the_launcher_invocation() {
    let args = parse(&["-t", "3600", "-n", "10000", "-u", "0", "-p", "60", "-d", "-c", "/etc/mcjob.toml"]);

    assert_eq!(args.user, "mcuser");
    assert_eq!(args.workspace, PathBuf::from("/jobs/tester/plan/run.1"));
    assert!(args.daemon);
    assert_eq!(args.config, Some(PathBuf::from("/etc/mcjob.toml")));
    assert_eq!(args.poll_interval(), Some(Duration::from_secs(60)));
    assert_eq!(
        args.policy().unwrap(),
        StopPolicy {
            min_particles: 10_000,
            uncertainty_goal: 0.0,
            timeout: Duration::from_secs(3600),
        }
    );
}

#[test]
fn workspace_and_user_are_required() {
    assert!(MonitorArgs::try_parse_from(["mcjob-monitor", "-l", "mcuser"]).is_err());
    assert!(MonitorArgs::try_parse_from(["mcjob-monitor", "-w", "/tmp/ws"]).is_err());
}

#[yare::parameterized(
    no_goal          = { &["-t", "3600"] },
    negative_goal    = { &["-n", "10", "--uncertainty=-1"] },
    not_a_number     = { &["-u", "NaN"] },
)]
fn rejects_unusable_thresholds(extra: &[&str]) {
    assert!(parse(extra).policy().is_err());
}

#[test]
fn zero_poll_interval_falls_back_to_config() {
    assert_eq!(parse(&["-n", "10", "-p", "0"]).poll_interval(), None);
    assert_eq!(parse(&["-n", "10"]).poll_interval(), None);
}
