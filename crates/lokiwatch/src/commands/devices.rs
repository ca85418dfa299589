//! IoT device command handlers.

use tabled::Tabled;

use lokiwatch_api::LokiClient;
use lokiwatch_api::models::DeviceStateResponse;
use lokiwatch_core::{
    AlarmAction, AutoConfirm, BuzzerAction, Dashboard, DeviceCommand, DisplayRow, LedAction,
    ViewKind, ViewPage,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Motion")]
    motion: String,
    #[tabled(rename = "Last seen")]
    last_seen: String,
}

impl From<&DisplayRow> for DeviceRow {
    fn from(row: &DisplayRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.title.clone(),
            dtype: util::field(row, "Type"),
            state: util::badges(row),
            motion: util::field(row, "Motion Detected"),
            last_seen: util::field(row, "Last seen"),
        }
    }
}

fn state_detail(s: &DeviceStateResponse) -> String {
    let mut pairs = vec![
        ("Device ID", s.device_id.clone()),
        (
            "Updated",
            s.last_updated.clone().unwrap_or_else(|| "N/A".into()),
        ),
    ];
    let values: Vec<(String, String)> = s
        .state
        .iter()
        .map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect();
    pairs.extend(values.iter().map(|(k, v)| (k.as_str(), v.clone())));
    output::detail_lines(&pairs)
}

/// Parse an action word with the command's strum parser.
fn action<T: std::str::FromStr>(raw: &str, allowed: &str) -> Result<T, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "action".into(),
        reason: format!("'{raw}' is not one of {allowed}"),
    })
}

async fn send(
    dashboard: &Dashboard<LokiClient>,
    device: &str,
    command: DeviceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ack = dashboard
        .dispatcher(AutoConfirm(true))
        .device_command(device, command)
        .await?;
    let message = ack
        .message
        .unwrap_or_else(|| format!("{} command sent to {device}", command.endpoint()));
    output::print_status(&message, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard<LokiClient>,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { list, device_type } => {
            let filters = [("device_type", device_type.as_deref())];
            let (page, model) =
                util::fetch_view(dashboard, ViewKind::Devices, &list, &filters).await?;
            let ViewPage::Devices(page) = page else {
                return Err(CliError::Internal {
                    message: "devices view returned another record type".into(),
                });
            };
            let out = output::render_view(
                &global.format(),
                &page.items,
                &model,
                |r| DeviceRow::from(r),
                |d| d.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            util::print_page_footer(&model, global);
            Ok(())
        }

        DevicesCommand::State { device } => {
            let state = dashboard.gateway().device_state(&device).await?;
            let out = output::render_single(&global.format(), &state, state_detail, |s| {
                s.device_id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Bulb {
            device,
            state,
            brightness,
        } => {
            let command = DeviceCommand::Bulb {
                on: state,
                brightness,
            };
            send(dashboard, &device, command, global).await
        }

        DevicesCommand::Alarm { device, action: raw } => {
            let command = DeviceCommand::Alarm(action::<AlarmAction>(&raw, "enable, disable, test")?);
            send(dashboard, &device, command, global).await
        }

        DevicesCommand::Buzzer {
            device,
            action: raw,
            duration,
        } => {
            let command = DeviceCommand::Buzzer {
                action: action::<BuzzerAction>(&raw, "on, off, beep")?,
                duration_ms: duration,
            };
            send(dashboard, &device, command, global).await
        }

        DevicesCommand::Led { device, action: raw } => {
            let command = DeviceCommand::Led(action::<LedAction>(&raw, "on, off, auto")?);
            send(dashboard, &device, command, global).await
        }
    }
}
