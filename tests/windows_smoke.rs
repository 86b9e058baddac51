#[cfg(windows)]
mod windows_smoke {
    use std::time::Duration;

    use pdhquery::{
        FormatFlags, PdhStatus, localize,
        pdh::{self, PerfQueryHandle},
        perf::PerfTracker,
    };

    const PROCESSOR_TIME: &str = r"\Processor(*)\% Processor Time";

    #[test]
    fn expand_processor_instances_without_total() {
        let counters = localize::localize_and_expand_counter(PROCESSOR_TIME).expect("expand");
        assert!(!counters.is_empty());
        assert!(counters.iter().all(|x| x.instance != "_Total"));
        assert!(counters.iter().all(|x| x.path.contains(&format!("({})", x.instance))));
    }

    #[test]
    fn global_query_collects_added_counter() {
        let counters = localize::localize_and_expand_counter(PROCESSOR_TIME).expect("expand");
        let counter = localize::add_counter(&counters[0].path).expect("add counter");
        localize::collect_query_data().expect("first collect");
        std::thread::sleep(Duration::from_millis(100));
        localize::collect_query_data().expect("second collect");

        let (_, value) =
            pdh::formatted_value_double(counter, FormatFlags::NOCAP100).expect("format");
        assert!(value.status.is_valid_data());
        assert!(value.value >= 0.0);
    }

    #[test]
    fn validate_rejects_unknown_counter() {
        let error = pdh::validate_path(r"\No Such Object(*)\No Such Counter").unwrap_err();
        assert!(error.status().is_some());
        assert_ne!(error.status(), Some(PdhStatus::ERROR_SUCCESS));
    }

    #[test]
    fn counter_info_reports_english_names() {
        let query = PerfQueryHandle::open_query().expect("open");
        let counter = query
            .add_english_counter(r"\Processor(_Total)\% Processor Time")
            .expect("add");
        let info = pdh::counter_info(counter, true).expect("info");
        assert!(!info.full_path.is_empty());
        assert!(info.instance_name.as_deref() == Some("_Total"));
    }

    #[test]
    fn wildcard_counter_formats_as_array() {
        let query = PerfQueryHandle::open_query().expect("open");
        let counter = query.add_english_counter(PROCESSOR_TIME).expect("add");
        query.collect_query_data().expect("first collect");
        std::thread::sleep(Duration::from_millis(100));
        query.collect_query_data().expect("second collect");

        let items = pdh::formatted_array_double(counter, FormatFlags::NONE).expect("array");
        assert!(items.iter().any(|x| x.name == "_Total"));
    }

    #[test]
    fn tracker_samples_every_instance() {
        let tracker = PerfTracker::new(PROCESSOR_TIME).expect("tracker");
        assert!(tracker.instance_count() > 0);
        tracker.start().expect("start");
        std::thread::sleep(Duration::from_millis(100));
        let total = tracker.total().expect("total");
        assert!(total >= 0.0);
        tracker.close().expect("close");
    }
}
