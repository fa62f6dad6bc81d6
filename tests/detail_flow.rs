use birdcam_shared::capabilities::{ShareError, ShareOperation, ShareOutput};
use birdcam_shared::model::VisitRecord;
use birdcam_shared::{App, CruxApp, Effect, Event, Model};
use crux_core::testing::AppTester;

fn share_requests(effects: Vec<Effect>) -> Vec<crux_core::Request<ShareOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Share(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn model_with_selected_robin() -> Model {
    let robin = VisitRecord {
        date_time: "2024-01-01T00:00:00Z".to_string(),
        bird_identification: "Robin".to_string(),
        bird_image: "robin.jpg".to_string(),
        identification_confidence: 87.0,
    };
    Model {
        visits: vec![robin.clone()],
        selected_visit: Some(robin),
        ..Model::default()
    }
}

#[test]
fn sharing_sends_the_capture_message() {
    let app = AppTester::<App, Effect>::default();
    let mut model = model_with_selected_robin();

    let update = app.update(Event::ShareVisitRequested, &mut model);
    let requests = share_requests(update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].operation,
        ShareOperation::ShareText {
            message: "Check out this Robin I captured on my bird monitor!".to_string(),
        }
    );
}

#[test]
fn share_without_a_selection_is_a_no_op() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::ShareVisitRequested, &mut model);
    assert!(share_requests(update.effects).is_empty());
}

#[test]
fn dismissed_share_sheet_is_not_an_error() {
    let app = AppTester::<App, Effect>::default();
    let mut model = model_with_selected_robin();

    app.update(
        Event::ShareFinished(Box::new(Ok(ShareOutput::Dismissed))),
        &mut model,
    );
    assert!(model.active_alert.is_none());

    app.update(
        Event::ShareFinished(Box::new(Err(ShareError::Failed {
            reason: "share service unavailable".to_string(),
        }))),
        &mut model,
    );
    assert!(model.active_alert.is_some());
}

#[test]
fn opening_the_image_checks_the_url_first() {
    let app = AppTester::<App, Effect>::default();
    let mut model = model_with_selected_robin();

    let update = app.update(Event::OpenImageRequested, &mut model);
    let mut requests = share_requests(update.effects);
    assert_eq!(requests.len(), 1);

    let expected_url = "http://192.168.1.61:5000/static/birdcaptures/robin.jpg";
    assert_eq!(
        requests[0].operation,
        ShareOperation::CanOpenUrl {
            url: expected_url.to_string(),
        }
    );

    let update = app
        .resolve(&mut requests[0], Ok(ShareOutput::CanOpen(true)))
        .expect("resolve URL check");

    let mut effects = Vec::new();
    for event in update.events {
        effects.extend(app.update(event, &mut model).effects);
    }

    let open = share_requests(effects);
    assert_eq!(open.len(), 1);
    assert_eq!(
        open[0].operation,
        ShareOperation::OpenUrl {
            url: expected_url.to_string(),
        }
    );
    assert!(model.active_alert.is_none());
}

#[test]
fn unopenable_url_raises_the_alert() {
    let app = AppTester::<App, Effect>::default();
    let mut model = model_with_selected_robin();

    let update = app.update(Event::OpenImageRequested, &mut model);
    let mut requests = share_requests(update.effects);

    let update = app
        .resolve(&mut requests[0], Ok(ShareOutput::CanOpen(false)))
        .expect("resolve URL check");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(
        model.active_alert.as_deref(),
        Some("Don't know how to open this URL: http://192.168.1.61:5000/static/birdcaptures/robin.jpg")
    );

    let view = App::default().view(&model);
    assert_eq!(view.alert, model.active_alert);

    app.update(Event::AlertDismissed, &mut model);
    assert!(model.active_alert.is_none());
}
