//! Trajectory analytics over stored object tracks: line-crossing counts,
//! lane cut-in/cut-out events, near-miss detection, calibrated speeds and
//! bounding-box smoothing.

pub mod analytics {
    pub mod domain {
        pub mod analysis_results;
        pub mod analytics_config;
        pub mod analytics_error;
        pub mod collision_risk_detector;
        pub mod events;
        pub mod lane_zone_classifier;
        pub mod line_crossing_counter;
        pub mod speed_estimator;
    }
}

pub mod pipeline {
    pub mod analytics_executor;
    pub mod analyze_video_use_case;
    pub mod pipeline_error;
    pub mod pipeline_logger;
    pub mod smooth_detections_use_case;

    pub mod infrastructure {
        pub mod threaded_analytics_executor;
    }
}

pub mod shared {
    pub mod constants;
    pub mod detection;
    pub mod geometry;
    pub mod scene;
    pub mod track;
    pub mod video_metadata;
}

pub mod smoothing {
    pub mod domain {
        pub mod smoothing_config;
        pub mod temporal_smoother;
    }
}

pub mod storage {
    pub mod domain {
        pub mod analytics_store;
        pub mod video_document;
    }
    pub mod infrastructure;
}
