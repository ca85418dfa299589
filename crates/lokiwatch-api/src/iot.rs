// IoT device and MQTT bridge endpoints

use crate::client::LokiClient;
use crate::error::Error;
use crate::models::{
    CommandResponse, DeviceResponse, DeviceStateResponse, ListBody, ListResponse, MessageResponse,
    MqttStatusResponse,
};

impl LokiClient {
    /// `GET /api/iot/devices`. The backend returns every device at once.
    pub async fn list_devices(&self) -> Result<ListResponse<DeviceResponse>, Error> {
        let url = self.endpoint(&["api", "iot", "devices"])?;
        let body: ListBody<DeviceResponse> = self.get(url).await?;
        Ok(body.into())
    }

    pub async fn device_state(&self, device_id: &str) -> Result<DeviceStateResponse, Error> {
        let url = self.endpoint(&["api", "iot", "devices", device_id, "state"])?;
        self.get(url).await
    }

    /// `POST /api/iot/devices/{id}/{command}` with the command in the query string.
    ///
    /// `command` is one of `bulb`, `alarm`, `buzzer`, `led`.
    pub async fn device_command(
        &self,
        device_id: &str,
        command: &str,
        params: &[(&str, String)],
    ) -> Result<CommandResponse, Error> {
        let url = self.endpoint(&["api", "iot", "devices", device_id, command])?;
        self.post_with_params(url, params).await
    }

    pub async fn mqtt_status(&self) -> Result<MqttStatusResponse, Error> {
        let url = self.endpoint(&["api", "iot", "mqtt", "status"])?;
        self.get(url).await
    }

    /// Ask the backend to (re)connect its MQTT bridge to `host:port`.
    ///
    /// The backend reports broker failures in-band with `success: false`
    /// and HTTP 200; that case is turned into [`Error::Api`].
    pub async fn mqtt_connect(&self, host: &str, port: u16) -> Result<MessageResponse, Error> {
        let url = self.endpoint(&["api", "iot", "mqtt", "connect"])?;
        let resp: MessageResponse = self
            .post_with_params(url, &[("host", host.to_owned()), ("port", port.to_string())])
            .await?;

        if resp.success == Some(false) {
            return Err(Error::Api {
                status: 200,
                message: resp
                    .message
                    .unwrap_or_else(|| format!("MQTT connect to {host}:{port} failed")),
            });
        }
        Ok(resp)
    }
}
