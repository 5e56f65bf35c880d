pub mod detector_factory;
pub mod math;
pub mod onnx_blazeface_detector;
pub mod onnx_face_mesh_landmarker;
pub mod onnx_session;
