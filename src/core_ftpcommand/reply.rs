use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// 1xx: the action started, expect another reply.
pub fn is_positive_preliminary(code: u16) -> bool {
    (100..200).contains(&code)
}

/// 2xx: the action completed.
pub fn is_positive_completion(code: u16) -> bool {
    (200..300).contains(&code)
}

/// 3xx: the command was accepted, more information is needed.
pub fn is_positive_intermediate(code: u16) -> bool {
    (300..400).contains(&code)
}

/// A complete (possibly multi-line) reply read from the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, message: &str) -> Self {
        Reply {
            code,
            lines: vec![message.to_string()],
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        is_positive_completion(self.code)
    }

    pub fn is_positive_preliminary(&self) -> bool {
        is_positive_preliminary(self.code)
    }

    /// Text of the last line, without the code.
    pub fn message(&self) -> &str {
        self.lines.last().map(|s| s.as_str()).unwrap_or("")
    }

    /// Extracts the data address from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
    pub fn parse_pasv_227(&self) -> Option<SocketAddr> {
        if self.code != 227 {
            return None;
        }
        let line = self.message();
        let p_start = line.find('(')?;
        let p_end = p_start + line[p_start..].find(')')?;

        let parts: Vec<&str> = line[p_start + 1..p_end].split(',').collect();
        if parts.len() != 6 {
            return None;
        }
        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts.iter()) {
            *octet = u8::from_str(part.trim()).ok()?;
        }

        let ip = IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]));
        let port = ((octets[4] as u16) << 8) | octets[5] as u16;
        Some(SocketAddr::new(ip, port))
    }

    /// Extracts the quoted directory from a `257 "/path" ...` reply.
    pub fn parse_pwd_257(&self) -> Option<String> {
        if self.code != 257 {
            return None;
        }
        let line = self.message();
        let start = line.find('"')? + 1;
        let rest = &line[start..];
        // Quotes inside the path are doubled.
        let mut path = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    path.push('"');
                } else {
                    return Some(path);
                }
            } else {
                path.push(c);
            }
        }
        None
    }
}
