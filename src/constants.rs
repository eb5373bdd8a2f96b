// src/constants.rs

pub const DEFAULT_PORT: u16 = 21;

/// Charset local names are encoded with before reinterpretation.
pub const DEFAULT_LOCAL_CHARSET: &str = "GBK";
/// Charset legacy servers store names under.
pub const DEFAULT_SERVER_CHARSET: &str = "ISO-8859-1";
/// Text encoding of the control channel until UTF8 is negotiated.
pub const DEFAULT_CONTROL_CHARSET: &str = "ISO-8859-1";
pub const DEFAULT_READ_CHARSET: &str = "UTF-8";

pub const TRANSFER_BUFFER_SIZE: usize = 64 * 1024;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/rouilleftp.conf";
