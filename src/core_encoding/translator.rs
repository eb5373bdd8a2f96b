use crate::constants::{DEFAULT_LOCAL_CHARSET, DEFAULT_SERVER_CHARSET};
use crate::core_error::{FtpError, FtpResult};
use encoding_rs::Encoding;
use log::warn;

/// Resolves a charset label (`"GBK"`, `"ISO-8859-1"`, `"utf8"`, ...) to an encoding.
pub fn charset_for_label(label: &str) -> FtpResult<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| FtpError::UnknownCharset(label.to_string()))
}

/// Translates path and file names into the form a legacy server expects.
///
/// Servers that cannot negotiate UTF8 store names as raw bytes in their own
/// locale. When enabled, a name is encoded with the local charset and those
/// bytes are reinterpreted as characters of the server charset; the control
/// channel then writes the reinterpreted string back out byte for byte.
#[derive(Debug, Clone)]
pub struct EncodingTranslator {
    enabled: bool,
    local: &'static Encoding,
    server: &'static Encoding,
}

impl Default for EncodingTranslator {
    fn default() -> Self {
        Self::new(
            charset_for_label(DEFAULT_LOCAL_CHARSET).unwrap_or(encoding_rs::GBK),
            charset_for_label(DEFAULT_SERVER_CHARSET).unwrap_or(encoding_rs::WINDOWS_1252),
        )
    }
}

impl EncodingTranslator {
    pub fn new(local: &'static Encoding, server: &'static Encoding) -> Self {
        Self {
            enabled: true,
            local,
            server,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replaces the charset pair. Doing so turns translation back on.
    pub fn set_charsets(&mut self, local: &'static Encoding, server: &'static Encoding) {
        self.local = local;
        self.server = server;
        self.enabled = true;
    }

    pub fn charsets(&self) -> (&'static Encoding, &'static Encoding) {
        (self.local, self.server)
    }

    pub fn encode(&self, name: &str) -> String {
        if !self.enabled {
            return name.to_string();
        }
        let (bytes, _, unmappable) = self.local.encode(name);
        if unmappable {
            warn!(
                "Name {:?} has characters outside {}, they were replaced",
                name,
                self.local.name()
            );
        }
        let (reinterpreted, _) = self.server.decode_without_bom_handling(&bytes);
        reinterpreted.into_owned()
    }

    /// Reverses `encode` for names read back from the server.
    pub fn decode(&self, name: &str) -> String {
        if !self.enabled {
            return name.to_string();
        }
        let (bytes, _, _) = self.server.encode(name);
        let (original, _) = self.local.decode_without_bom_handling(&bytes);
        original.into_owned()
    }
}
