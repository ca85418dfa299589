//! MQTT bridge command handlers.

use lokiwatch_api::LokiClient;
use lokiwatch_core::{AutoConfirm, DEFAULT_MQTT_HOSTS, Dashboard, Gateway, MqttStatus};

use crate::cli::{GlobalOpts, MqttArgs, MqttCommand};
use crate::error::CliError;
use crate::output;

fn detail(s: &MqttStatus) -> String {
    let broker = match (&s.broker_host, s.broker_port) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.clone(),
        _ => "-".into(),
    };
    let mut pairs = vec![("Status", s.label().to_owned()), ("Broker", broker)];
    if let Some(ref message) = s.message {
        pairs.push(("Message", message.clone()));
    }
    output::detail_lines(&pairs)
}

pub async fn handle(
    dashboard: &Dashboard<LokiClient>,
    args: MqttArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MqttCommand::Status => {
            let status = Gateway::mqtt_status(dashboard.gateway()).await?;
            let out = output::render_single(&global.format(), &status, detail, |s| {
                s.label().to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MqttCommand::Connect { host, port } => {
            let hosts: Vec<&str> = if host.is_empty() {
                DEFAULT_MQTT_HOSTS.to_vec()
            } else {
                host.iter().map(String::as_str).collect()
            };
            let connected = dashboard
                .dispatcher(AutoConfirm(true))
                .connect_mqtt(&hosts, port)
                .await?;
            output::print_status(
                &format!("MQTT bridge connected to {connected}:{port}"),
                global.quiet,
            );
            Ok(())
        }
    }
}
