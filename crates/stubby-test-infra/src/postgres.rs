use crate::{Result, TestInfraError};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use typed_builder::TypedBuilder;

const POSTGRES_PORT: u16 = 5432;

/// Wire form of the PostgreSQL `SSLRequest` startup message.
const SSL_REQUEST: [u8; 8] = [0, 0, 0, 8, 0x04, 0xd2, 0x16, 0x2f];

#[derive(TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "stubby".to_string(), setter(into))]
    database: String,
    #[builder(default = "stubby".to_string(), setter(into))]
    username: String,
    #[builder(default = "stubby".to_string(), setter(into))]
    password: String,
    #[builder(default = "16-alpine".to_string(), setter(into))]
    tag: String,
    /// How long to wait for the server to accept TCP clients after start.
    #[builder(default = Duration::from_secs(30))]
    ready_timeout: Duration,
}

/// Test fixture for a disposable PostgreSQL server.
///
/// The image runs its init scripts against a socket-only server and then
/// restarts it, so the first "ready" log line is not enough. [`Self::new`]
/// returns once the server answers a startup message on the mapped port.
pub struct PostgresServer {
    container: ContainerAsync<GenericImage>,
    config: PostgresConfig,
}

impl PostgresServer {
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        let container = GenericImage::new("postgres", config.tag.as_str())
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await?;

        let server = Self { container, config };
        server.wait_until_ready().await?;
        Ok(server)
    }

    pub async fn host(&self) -> Result<String> {
        Ok(self.container.get_host().await?.to_string())
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(POSTGRES_PORT).await?)
    }

    /// Connection string in the form sqlx expects.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }

    async fn wait_until_ready(&self) -> Result<()> {
        let address = format!("{}:{}", self.host().await?, self.port().await?);
        let deadline = Instant::now() + self.config.ready_timeout;

        while Instant::now() < deadline {
            if answers_startup(&address).await {
                return Ok(());
            }
            sleep(Duration::from_millis(200)).await;
        }

        Err(TestInfraError::NotReady {
            address,
            waited: self.config.ready_timeout,
        })
    }
}

/// Sends an `SSLRequest` and expects the one-byte `S`/`N` answer.
///
/// Docker's port proxy accepts connections before the server listens, so a
/// bare TCP connect proves nothing.
async fn answers_startup(address: &str) -> bool {
    let probe = async {
        let mut stream = TcpStream::connect(address).await.ok()?;
        stream.write_all(&SSL_REQUEST).await.ok()?;
        let mut reply = [0_u8; 1];
        stream.read_exact(&mut reply).await.ok()?;
        Some(reply[0])
    };

    matches!(
        timeout(Duration::from_secs(1), probe).await,
        Ok(Some(b'S' | b'N'))
    )
}
