use crate::config::{FastpassOrder, FlowType, HostType, LoadBalancing, QueueType, SimConfig};
use crate::error::ConfigError;

#[test]
fn parses_known_keys_and_ignores_comments() {
    let cfg = SimConfig::parse(
        "# experiment\n\
         init_cwnd: 6\n\
         max_cwnd: 24\n\
         retx_timeout: 9.5e-05\n\
         queue_type: 1\n\
         flow_type: 1\n\
         host_type: 2\n\
         \n\
         bandwidth: 40000000000.0\n\
         load_balancing: 1\n\
         cut_through: 1\n\
         flow_trace: ./cdf.txt\n\
         num_flow: 500   trailing words are ignored\n\
         capability_window: 8\n",
    )
    .expect("parse config");

    assert_eq!(cfg.init_cwnd, 6);
    assert_eq!(cfg.max_cwnd, 24);
    assert!((cfg.retx_timeout - 9.5e-5).abs() < 1e-12);
    assert_eq!(cfg.queue_type, QueueType::DropTail);
    assert_eq!(cfg.flow_type, FlowType::Normal);
    assert_eq!(cfg.host_type, HostType::Scheduling);
    assert_eq!(cfg.bandwidth, 40e9);
    assert_eq!(cfg.load_balancing, LoadBalancing::PerFlow);
    assert!(cfg.cut_through);
    assert_eq!(cfg.flow_trace, "./cdf.txt");
    assert_eq!(cfg.num_flow, 500);
    assert_eq!(cfg.tunables.get("capability_window").map(String::as_str), Some("8"));
}

#[test]
fn dctcp_tunables_are_accepted_and_stored() {
    let cfg = SimConfig::parse("dctcp_mark_thresh: 65\ndctcp_delayed_ack_freq: 2\n").expect("parse config");
    assert_eq!(cfg.tunables.get("dctcp_mark_thresh").map(String::as_str), Some("65"));
    assert_eq!(cfg.tunables.get("dctcp_delayed_ack_freq").map(String::as_str), Some("2"));
}

#[test]
fn defaults_match_the_reference_experiment() {
    let cfg = SimConfig::parse("").expect("empty config");
    assert_eq!(cfg.init_cwnd, 12);
    assert_eq!(cfg.max_cwnd, 15);
    assert_eq!(cfg.queue_size, 36_864);
    assert_eq!(cfg.queue_type, QueueType::PFabric);
    assert_eq!(cfg.flow_type, FlowType::PFabric);
    assert_eq!(cfg.num_hosts, 144);
    assert_eq!(cfg.hosts_per_agg(), 16);
    assert_eq!(cfg.mss, 1460);
    assert_eq!(cfg.hdr_size, 40);
}

#[test]
fn unknown_key_is_fatal() {
    let err = SimConfig::parse("init_cwnd: 6\nwarp_drive: 1\n").expect_err("unknown key");
    match err {
        ConfigError::UnknownKey { line, key } => {
            assert_eq!(line, 2);
            assert_eq!(key, "warp_drive");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_lines_and_values_are_rejected() {
    assert!(matches!(
        SimConfig::parse("init_cwnd 6\n"),
        Err(ConfigError::Malformed { line: 1, .. })
    ));
    assert!(matches!(
        SimConfig::parse("init_cwnd: six\n"),
        Err(ConfigError::InvalidValue { line: 1, .. })
    ));
    assert!(matches!(
        SimConfig::parse("init_cwnd:\n"),
        Err(ConfigError::InvalidValue { line: 1, .. })
    ));
}

#[test]
fn unsupported_type_codes_are_rejected() {
    assert!(matches!(
        SimConfig::parse("queue_type: 3\n"),
        Err(ConfigError::Unsupported { what: "queue_type", code: 3 })
    ));
    assert!(matches!(
        SimConfig::parse("flow_type: 112\n"),
        Err(ConfigError::Unsupported { what: "flow_type", code: 112 })
    ));
}

#[test]
fn fabric_constraints_are_validated() {
    assert!(matches!(
        SimConfig::parse("num_hosts: 10\nnum_agg_switches: 3\n"),
        Err(ConfigError::Fabric(_))
    ));
    assert!(matches!(SimConfig::parse("hdr_size: 0\n"), Err(ConfigError::Fabric(_))));
    // 单交换机拓扑不要求主机数整除
    let cfg = SimConfig::parse("big_switch: 1\nnum_hosts: 10\nnum_agg_switches: 3\n").expect("single switch");
    assert_eq!(cfg.num_hosts, 10);
}

#[test]
fn deadline_scheduling_overrides_the_fastpass_order() {
    let cfg = SimConfig::parse("fastpass_order: 1\n").expect("config");
    assert_eq!(cfg.effective_fastpass_order(), FastpassOrder::FewestRemaining);

    let cfg = SimConfig::parse("fastpass_order: 1\ndeadline: 1\nschedule_by_deadline: 1\n").expect("config");
    assert_eq!(cfg.effective_fastpass_order(), FastpassOrder::EarliestDeadline);
}

#[test]
fn epoch_time_covers_the_slots_plus_half_a_packet() {
    let cfg = SimConfig::parse("fastpass_epoch_pkts: 8\n").expect("config");
    let expected = 1500.0 * 8.0 * 8.5 / 10e9;
    assert!((cfg.fastpass_epoch_time() - expected).abs() < 1e-15);
}
