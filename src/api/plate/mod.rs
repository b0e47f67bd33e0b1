// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vehicle / plate recognition endpoint (`POST /api/plate/recognize`)

pub mod handler;
pub mod response;

pub use handler::plate_recognize_handler;
pub use response::PlateRecognitionResponse;
