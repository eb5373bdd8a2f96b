use crate::config::ClientConfig;
use crate::constants::TRANSFER_BUFFER_SIZE;
use crate::core_encoding::{charset_for_label, EncodingTranslator};
use crate::core_error::{FtpError, FtpResult};
use crate::core_ftpcommand::reply::is_positive_completion;
use crate::core_ftpcommand::FtpCommand;
use crate::core_network::{FtpTransport, TcpTransport};
use log::{debug, info, warn};

/// One authenticated FTP connection.
///
/// A session is not meant to be shared: every operation takes `&mut self`
/// and the server-side working directory is part of its state. Call
/// [`Session::dispose`] when done; afterwards every operation fails with
/// [`FtpError::SessionDisposed`].
pub struct Session<T: FtpTransport = TcpTransport> {
    transport: Option<T>,
    passive: bool,
    translator: EncodingTranslator,
    buffer_size: usize,
}

impl Session<TcpTransport> {
    /// Connects, logs in and negotiates UTF8.
    pub async fn connect(host: &str, port: u16, user: &str, password: &str) -> FtpResult<Self> {
        let transport = TcpTransport::connect(host, port)
            .await
            .map_err(|source| FtpError::Connect {
                addr: format!("{}:{}", host, port),
                source,
            })?;
        Self::login(transport, user, password).await
    }

    /// Connects with the settings of a `[client]` configuration section.
    pub async fn from_config(config: &ClientConfig) -> FtpResult<Self> {
        let mut session =
            Self::connect(&config.host, config.port, &config.username, &config.password).await?;
        session.configure(config)?;
        Ok(session)
    }
}

impl<T: FtpTransport> Session<T> {
    /// Logs in over an already opened transport.
    ///
    /// The transport is disconnected before any error is returned.
    pub async fn login(mut transport: T, user: &str, password: &str) -> FtpResult<Self> {
        let code = match transport.login(user, password).await {
            Ok(code) => code,
            Err(e) => {
                Self::abandon(&mut transport).await;
                return Err(e.into());
            }
        };
        if !is_positive_completion(code) {
            warn!("Login refused for user {} (reply {})", user, code);
            Self::abandon(&mut transport).await;
            return Err(FtpError::Auth(code));
        }
        info!("Logged in as {}", user);

        transport.enter_passive_mode();
        let mut session = Session {
            transport: Some(transport),
            passive: true,
            translator: EncodingTranslator::default(),
            buffer_size: TRANSFER_BUFFER_SIZE,
        };
        session.negotiate_utf8().await;
        Ok(session)
    }

    async fn abandon(transport: &mut T) {
        if transport.is_connected() {
            if let Err(e) = transport.disconnect().await {
                debug!("Error while closing failed connection: {}", e);
            }
        }
    }

    /// Asks the server for UTF8 names. When it agrees, names no longer need
    /// translating.
    async fn negotiate_utf8(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        match transport.send_command(FtpCommand::OPTS, Some("UTF8 ON")).await {
            Ok(code) if is_positive_completion(code) => {
                transport.set_control_encoding(encoding_rs::UTF_8);
                self.translator.set_enabled(false);
                info!("Server accepted UTF8, filename translation disabled");
            }
            Ok(code) => debug!("OPTS UTF8 ON refused ({}), keeping filename translation", code),
            Err(e) => debug!("OPTS UTF8 ON failed: {}", e),
        }
    }

    fn configure(&mut self, config: &ClientConfig) -> FtpResult<()> {
        self.set_passive_mode(config.passive_mode)?;
        if let (Some(local), Some(server)) = (&config.local_charset, &config.server_charset) {
            self.set_encoding(local, server)?;
        }
        if let Some(size) = config.transfer_buffer_size {
            self.set_buffer_size(size);
        }
        Ok(())
    }

    pub(crate) fn transport(&mut self) -> FtpResult<&mut T> {
        self.transport.as_mut().ok_or(FtpError::SessionDisposed)
    }

    /// Applies the encoding translator to one path or name.
    pub(crate) fn encode(&self, name: &str) -> String {
        self.translator.encode(name)
    }

    pub(crate) fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn is_disposed(&self) -> bool {
        self.transport.is_none()
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    /// Chooses the data channel strategy for every following transfer.
    pub fn set_passive_mode(&mut self, passive: bool) -> FtpResult<()> {
        let transport = self.transport()?;
        if passive {
            transport.enter_passive_mode();
        } else {
            transport.enter_active_mode();
        }
        self.passive = passive;
        debug!("{} mode selected", if passive { "Passive" } else { "Active" });
        Ok(())
    }

    pub fn translator(&self) -> &EncodingTranslator {
        &self.translator
    }

    pub fn set_encoding_mode(&mut self, enabled: bool) {
        self.translator.set_enabled(enabled);
    }

    /// Sets the local and server charsets; translation is switched on again.
    pub fn set_encoding(&mut self, local: &str, server: &str) -> FtpResult<()> {
        let local = charset_for_label(local)?;
        let server = charset_for_label(server)?;
        self.translator.set_charsets(local, server);
        Ok(())
    }

    pub fn set_buffer_size(&mut self, size: usize) {
        self.buffer_size = size.max(1);
    }

    /// Current remote working directory as reported by PWD.
    pub async fn working_directory(&mut self) -> FtpResult<Option<String>> {
        Ok(self.transport()?.print_working_directory().await?)
    }

    /// Logs out and closes the connection. Transport errors are ignored.
    pub async fn dispose(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        if transport.is_connected() {
            if let Err(e) = transport.logout().await {
                debug!("Logout failed: {}", e);
            }
            if let Err(e) = transport.disconnect().await {
                debug!("Disconnect failed: {}", e);
            }
        }
        info!("Session closed");
    }
}

impl<T: FtpTransport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!("Session dropped without dispose(), closing connection");
        }
    }
}
