use std::fmt;

/// Commands the client issues on the control channel.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    LIST,
    CWD,
    CDUP,
    MKD,
    RMD,
    DELE,
    RETR,
    STOR,
    PORT,
    PASV,
    TYPE,
    OPTS,
}

impl FtpCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpCommand::USER => "USER",
            FtpCommand::PASS => "PASS",
            FtpCommand::QUIT => "QUIT",
            FtpCommand::PWD => "PWD",
            FtpCommand::LIST => "LIST",
            FtpCommand::CWD => "CWD",
            FtpCommand::CDUP => "CDUP",
            FtpCommand::MKD => "MKD",
            FtpCommand::RMD => "RMD",
            FtpCommand::DELE => "DELE",
            FtpCommand::RETR => "RETR",
            FtpCommand::STOR => "STOR",
            FtpCommand::PORT => "PORT",
            FtpCommand::PASV => "PASV",
            FtpCommand::TYPE => "TYPE",
            FtpCommand::OPTS => "OPTS",
        }
    }

    /// Renders the command line without the trailing CRLF.
    pub fn line(&self, arg: Option<&str>) -> String {
        match arg {
            Some(arg) if !arg.is_empty() => format!("{} {}", self.as_str(), arg),
            _ => self.as_str().to_string(),
        }
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representation type for data transfers (TYPE command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Ascii,
    Binary,
}

impl FileType {
    pub fn type_code(&self) -> &'static str {
        match self {
            FileType::Ascii => "A",
            FileType::Binary => "I",
        }
    }
}
