//! RabbitMQ 事件接收端
//!
//! 将 Company 变更事件发布到 topic 交换机，路由键为 company.<event_type>

use crate::config::EventsConfig;
use crate::events::{EventError, EventSink, MutationEvent};
use async_trait::async_trait;
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection, ConnectionProperties,
    ExchangeKind,
};
use secrecy::ExposeSecret;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 已建立的连接与通道
struct Link {
    // 通道依赖连接存活
    #[allow(dead_code)]
    connection: Connection,
    channel: Channel,
}

/// RabbitMQ 事件发布器
///
/// 连接按需建立；通道断开后下一次发送时重新连接。
pub struct RabbitMqEventSink {
    config: EventsConfig,
    link: RwLock<Option<Link>>,
}

impl RabbitMqEventSink {
    pub fn new(config: EventsConfig) -> Self {
        Self {
            config,
            link: RwLock::new(None),
        }
    }

    /// 立即建立连接并声明交换机
    pub async fn connect(&self) -> Result<(), EventError> {
        let mut writer = self.link.write().await;
        *writer = Some(self.open().await?);
        Ok(())
    }

    async fn open(&self) -> Result<Link, EventError> {
        let amqp_url = self.config.amqp_url.expose_secret();
        info!(exchange = %self.config.exchange, "Connecting to RabbitMQ");

        let connection = Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        // 设置发布者确认
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        channel
            .exchange_declare(
                &self.config.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        info!(exchange = %self.config.exchange, "RabbitMQ event exchange ready");

        Ok(Link {
            connection,
            channel,
        })
    }

    /// 获取可用通道，必要时重新连接
    async fn channel(&self) -> Result<Channel, EventError> {
        {
            let reader = self.link.read().await;
            if let Some(link) = reader.as_ref() {
                if link.channel.status().connected() {
                    return Ok(link.channel.clone());
                }
            }
        }

        let mut writer = self.link.write().await;
        // 其他任务可能已经完成重连
        if let Some(link) = writer.as_ref() {
            if link.channel.status().connected() {
                return Ok(link.channel.clone());
            }
        }

        warn!("RabbitMQ channel unavailable, reconnecting");
        let link = self.open().await?;
        let channel = link.channel.clone();
        *writer = Some(link);
        Ok(channel)
    }
}

#[async_trait]
impl EventSink for RabbitMqEventSink {
    async fn send(&self, event: &MutationEvent) -> Result<(), EventError> {
        let payload = event.to_json()?;
        let routing_key = event.event_type.routing_key();
        let channel = self.channel().await?;

        let confirm = channel
            .basic_publish(
                &self.config.exchange,
                &routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // 持久化
                    .with_content_type("application/json".into()),
            )
            .await?
            .await?;

        if confirm.is_nack() {
            return Err(EventError::Transport(format!(
                "broker rejected event {}",
                routing_key
            )));
        }

        debug!(%routing_key, "Event published and acknowledged");
        Ok(())
    }
}
