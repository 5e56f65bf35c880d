pub mod config;

pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
}

pub mod decoding {
    pub mod payload_decoder;
}

pub mod detection {
    pub mod domain {
        pub mod detection_strategy;
        pub mod face_detector;
        pub mod frame_enhancer;
        pub mod head_pose;
        pub mod landmark_model;
        pub mod landmark_set;
    }
    pub mod infrastructure;
}

pub mod extraction {
    pub mod detection_report;
    pub mod face_extractor;
    pub mod region_encoder;
}

pub mod pipeline {
    pub mod capture_face_use_case;
    pub mod detect_face_use_case;
    pub mod detect_gesture_use_case;
}
