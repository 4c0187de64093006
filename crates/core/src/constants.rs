// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Names reserved inside a job's storage namespace.

/// File in a job namespace that holds the status record.
pub const JOB_STATUS_FILE: &str = "job_status.json";

/// Folder in a job namespace that holds the input data for a runner.
pub const INPUT_DIR: &str = "inputs";

/// Folder in a job namespace that holds the output data of a runner.
pub const OUTPUT_DIR: &str = "outputs";

/// Default name for the single input file of a runner.
pub const DEFAULT_PAYLOAD_FILE: &str = "input";

/// Default name for the single output file of a runner.
pub const DEFAULT_OUTPUT_FILE: &str = "output";

/// Storage folder delimiter.
pub const FOLDER_DELIMITER: &str = "/";

/// Default path to the single input file in a job namespace.
pub const DEFAULT_PAYLOAD_PATH: &str = "inputs/input";

/// Default path to the single output file in a job namespace.
pub const DEFAULT_OUTPUT_PATH: &str = "outputs/output";
