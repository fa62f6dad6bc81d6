use birdcam_shared::capabilities::{
    HttpError, HttpMethod, HttpOperation, HttpResponse, KvOperation, KvOutput,
};
use birdcam_shared::{App, ConnectionField, CruxApp, Effect, Event, Model};
use crux_core::testing::AppTester;

fn split_effects(
    effects: Vec<Effect>,
) -> (
    Vec<crux_core::Request<HttpOperation>>,
    Vec<crux_core::Request<KvOperation>>,
) {
    let mut http = Vec::new();
    let mut kv = Vec::new();
    for effect in effects {
        match effect {
            Effect::Http(request) => http.push(request),
            Effect::KeyValue(request) => kv.push(request),
            _ => {}
        }
    }
    (http, kv)
}

#[test]
fn startup_restores_the_stored_camera_address() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::AppStarted, &mut model);
    let (http, mut kv) = split_effects(update.effects);
    assert!(http.is_empty());
    assert_eq!(kv.len(), 2);

    for request in &mut kv {
        let stored = match &request.operation {
            KvOperation::Read { key } if key.as_str() == "cameraIP" => "192.168.1.99",
            KvOperation::Read { key } if key.as_str() == "cameraPort" => "8080",
            other => panic!("unexpected storage operation: {other:?}"),
        };
        let update = app
            .resolve(request, Ok(KvOutput::Value(Some(stored.to_string()))))
            .expect("resolve storage read");
        for event in update.events {
            app.update(event, &mut model);
        }
    }

    assert_eq!(model.connection.host, "192.168.1.99");
    assert_eq!(model.connection.port, "8080");
}

#[test]
fn mounting_settings_reads_storage_and_fetches_device_settings() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::SettingsScreenMounted, &mut model);
    assert!(model.settings_loading);

    let (mut http, mut kv) = split_effects(update.effects);
    assert_eq!(http.len(), 1);
    assert_eq!(kv.len(), 2);

    let keys: Vec<String> = kv
        .iter()
        .map(|request| match &request.operation {
            KvOperation::Read { key } => key.as_str().to_string(),
            KvOperation::Write { .. } => panic!("mount must not write storage"),
        })
        .collect();
    assert!(keys.contains(&"cameraIP".to_string()));
    assert!(keys.contains(&"cameraPort".to_string()));

    // Stored host overrides the default.
    let host_index = keys.iter().position(|k| k == "cameraIP").unwrap();
    let update = app
        .resolve(
            &mut kv[host_index],
            Ok(KvOutput::Value(Some("10.0.0.5".to_string()))),
        )
        .expect("resolve host read");
    for event in update.events {
        app.update(event, &mut model);
    }
    assert_eq!(model.connection.host, "10.0.0.5");

    // No stored port: the default stands.
    let port_index = 1 - host_index;
    let update = app
        .resolve(&mut kv[port_index], Ok(KvOutput::Value(None)))
        .expect("resolve port read");
    for event in update.events {
        app.update(event, &mut model);
    }
    assert_eq!(model.connection.port, "5000");

    // Device settings land in the editable inputs.
    let HttpOperation::Execute(ref request) = http[0].operation;
    assert_eq!(request.method(), HttpMethod::Get);
    assert_eq!(request.url().as_str(), "http://192.168.1.61:5000/settings");

    let body = r#"{"threshold":0.35,"frameCount":10}"#;
    let update = app
        .resolve(&mut http[0], Ok(HttpResponse::ok(body.into())))
        .expect("resolve settings fetch");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.settings_loading);
    assert_eq!(model.device_settings.threshold, 0.35);
    assert_eq!(model.device_settings.frame_count, 10);

    let view = App::default().view(&model);
    assert_eq!(view.settings.threshold_input, "0.35");
    assert_eq!(view.settings.frame_count_input, "10");
}

#[test]
fn failed_settings_fetch_keeps_remote_fields_hidden() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::SettingsScreenMounted, &mut model);
    let (mut http, _) = split_effects(update.effects);
    assert_eq!(http.len(), 1);

    let update = app
        .resolve(
            &mut http[0],
            Err(HttpError::Network {
                message: "connection refused".to_string(),
            }),
        )
        .expect("resolve settings fetch");
    for event in update.events {
        app.update(event, &mut model);
    }

    // The editable fields never appeared, so there is nothing a blur
    // could send back to the device.
    assert!(model.settings_loading);
    assert!(model.threshold_input.is_empty());
    assert!(model.frame_count_input.is_empty());

    let view = App::default().view(&model);
    assert!(view.settings.is_loading);

    let update = app.update(Event::SettingsFieldCommitted, &mut model);
    let (http, _) = split_effects(update.effects);
    assert!(
        http.is_empty(),
        "no settings document may be posted before a successful fetch"
    );
}

#[test]
fn committing_valid_inputs_posts_the_full_settings_document() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::ThresholdInputChanged {
            text: "0.7".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::FrameCountInputChanged {
            text: "5".to_string(),
        },
        &mut model,
    );

    let update = app.update(Event::SettingsFieldCommitted, &mut model);
    let (http, _) = split_effects(update.effects);
    assert_eq!(http.len(), 1);

    let HttpOperation::Execute(ref request) = http[0].operation;
    assert_eq!(request.method(), HttpMethod::Post);
    assert_eq!(request.url().as_str(), "http://192.168.1.61:5000/settings");
    assert_eq!(
        request.headers().get("content-type"),
        Some("application/json")
    );
    assert_eq!(
        request.body(),
        Some(r#"{"threshold":0.7,"frameCount":5}"#.as_bytes())
    );

    assert_eq!(model.device_settings.threshold, 0.7);
    assert_eq!(model.device_settings.frame_count, 5);
}

#[test]
fn invalid_inputs_never_reach_the_device() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::ThresholdInputChanged {
            text: "abc".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::FrameCountInputChanged {
            text: "5".to_string(),
        },
        &mut model,
    );

    let update = app.update(Event::SettingsFieldCommitted, &mut model);
    let (http, _) = split_effects(update.effects);
    assert!(http.is_empty(), "invalid threshold must not be posted");
    assert!(model.threshold_error.is_some());
    assert!(model.frame_count_error.is_none());

    // Out-of-range and non-integer values fail the same way.
    app.update(
        Event::ThresholdInputChanged {
            text: "1.5".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::FrameCountInputChanged {
            text: "2.5".to_string(),
        },
        &mut model,
    );
    let update = app.update(Event::SettingsFieldCommitted, &mut model);
    let (http, _) = split_effects(update.effects);
    assert!(http.is_empty());
    assert!(model.threshold_error.is_some());
    assert!(model.frame_count_error.is_some());

    let view = App::default().view(&model);
    assert!(view.settings.threshold_error.is_some());
    assert!(view.settings.frame_count_error.is_some());
}

#[test]
fn editing_the_host_persists_it_under_the_storage_key() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::ConnectionFieldChanged {
            field: ConnectionField::Host,
            value: "camera.local".to_string(),
        },
        &mut model,
    );

    assert_eq!(model.connection.host, "camera.local");

    let (_, kv) = split_effects(update.effects);
    assert_eq!(kv.len(), 1);
    match &kv[0].operation {
        KvOperation::Write { key, value } => {
            assert_eq!(key.as_str(), "cameraIP");
            assert_eq!(value, "camera.local");
        }
        KvOperation::Read { .. } => panic!("expected a storage write"),
    }

    // The next fetch uses the edited address.
    let update = app.update(Event::VisitsRefreshRequested, &mut model);
    let (http, _) = split_effects(update.effects);
    let HttpOperation::Execute(ref request) = http[0].operation;
    assert_eq!(request.url().as_str(), "http://camera.local:5000/visitsjson");
}
