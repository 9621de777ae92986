use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tower::ServiceExt;
use yocto_exporter::{
    device::simulated::{FaultPoint, SessionEventKind},
    web::create_app,
    Collector, DeviceSession, FunctionKind, MetricsRegistry, SimulatedHub, SimulatedModule,
    Supervisor, WebConfig,
};

async fn scrape(registry: &Arc<MetricsRegistry>) -> String {
    let app = create_app(&WebConfig::default(), registry.clone());
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .expect("Should serve metrics");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Metrics should be UTF-8")
}

async fn start(hub: SimulatedHub) -> (Supervisor<SimulatedHub>, Arc<MetricsRegistry>) {
    let mut hub = hub;
    hub.register_hub().await.expect("Should register simulated hub");
    let registry = Arc::new(MetricsRegistry::new().expect("Should create registry"));
    let supervisor = Supervisor::new(Collector::new(hub, registry.clone()), true);
    (supervisor, registry)
}

fn greenhouse() -> SimulatedModule {
    SimulatedModule::new("METEOMK1-00001", "greenhouse-1")
        .with_usb_current(24.0)
        .with_luminosity(50.0)
        .with_function(FunctionKind::Temperature, "21.5")
        .with_function(FunctionKind::Humidity, "55.0")
}

#[tokio::test(start_paused = true)]
async fn test_greenhouse_scrape() {
    let (mut supervisor, registry) = start(SimulatedHub::new(vec![greenhouse()])).await;

    // Warm-up pass before serving
    supervisor.step().await.expect("Warm-up should succeed");

    let body = scrape(&registry).await;
    assert!(body.contains(
        r#"temperature{hardware_id="greenhouse-1.temperature",unit="Celsius"} 21.5"#
    ));
    assert!(body.contains(r#"humidity{hardware_id="greenhouse-1.humidity",unit="% RH"} 55"#));
    assert!(body.contains(r#"usb_current{hardware_id="greenhouse-1.current",unit="mA"} 24"#));
    assert!(body.contains(r#"luminosity{hardware_id="greenhouse-1.luminosity",unit="%"} 50"#));
    assert!(body.contains(r#"sensor_read_time{unit="s"} 2"#));
    assert!(body.contains("sensor_read_passes 1"));
    assert!(body.contains("yapi_exceptions 0"));
    assert!(!body.contains("dataLogger"));
}

#[tokio::test(start_paused = true)]
async fn test_zero_modules_scrape() {
    let (mut supervisor, registry) = start(SimulatedHub::new(Vec::new())).await;

    supervisor.step().await.unwrap();

    let body = scrape(&registry).await;
    assert!(body.contains("sensor_read_passes 1"));
    assert!(!body.contains("hardware_id"));
}

#[tokio::test(start_paused = true)]
async fn test_fault_mid_pass_recovers() {
    let hub = SimulatedHub::new(vec![greenhouse()]).with_fault(FaultPoint::FunctionRead {
        serial: "METEOMK1-00001".to_string(),
        index: 2,
    });
    let log = hub.log();
    let (mut supervisor, registry) = start(hub).await;

    assert!(supervisor.step().await.unwrap().is_none());
    assert_eq!(registry.faults(), 1);
    assert_eq!(registry.passes(), 0);
    assert_eq!(log.count(&SessionEventKind::Unregistered), 1);
    assert_eq!(log.count(&SessionEventKind::Registered), 2);

    // Periodic collection resumes without leaving the loop.
    let outcome = time::timeout(Duration::from_secs(20), supervisor.run()).await;
    assert!(outcome.is_err());
    assert!(registry.passes() >= 2);
    assert_eq!(registry.faults(), 1);

    let body = scrape(&registry).await;
    assert!(body.contains("yapi_exceptions 1"));
}

#[tokio::test(start_paused = true)]
async fn test_reregistration_failure_stops_collection() {
    let hub = SimulatedHub::new(vec![greenhouse()])
        .with_fault_on_occurrence(FaultPoint::Enumeration, 2)
        .refuse_registration_from(2);
    let log = hub.log();
    let (mut supervisor, registry) = start(hub).await;

    supervisor.step().await.expect("Warm-up should succeed");
    let err = supervisor.run().await.expect_err("Should stop on registration failure");
    assert!(err.to_string().contains("RegisterHub error"));

    assert_eq!(registry.passes(), 1);
    assert_eq!(registry.faults(), 1);
    assert_eq!(
        log.kinds().last(),
        Some(&SessionEventKind::RegistrationRefused)
    );
    assert_eq!(log.count(&SessionEventKind::Enumerated), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scrape_during_pass() {
    let module = SimulatedModule::new("METEOMK1-00001", "greenhouse-1")
        .with_function(FunctionKind::Temperature, "21.5")
        .with_function(FunctionKind::Pressure, "1013.2")
        .with_function(FunctionKind::LightSensor, "312")
        .with_function(FunctionKind::CarbonDioxide, "415");
    let (mut supervisor, registry) = start(SimulatedHub::new(vec![module])).await;

    let pass = tokio::spawn(async move {
        supervisor.step().await.unwrap();
        supervisor
    });

    // Halfway through the pacing of the second function.
    time::sleep(Duration::from_millis(1500)).await;
    let body = scrape(&registry).await;
    assert!(body.contains(r#"hardware_id="greenhouse-1.temperature""#));
    assert!(body.contains("sensor_read_passes 0"));

    pass.await.expect("Pass task should complete");
    let body = scrape(&registry).await;
    assert!(body.contains(r#"pressure{hardware_id="greenhouse-1.pressure",unit="mbar"} 1013.2"#));
    assert!(body.contains(r#"light{hardware_id="greenhouse-1.light",unit="lux"} 312"#));
    assert!(body.contains(r#"co2{hardware_id="greenhouse-1.co2",unit="ppm"} 415"#));
    assert!(body.contains("sensor_read_passes 1"));
}

#[tokio::test(start_paused = true)]
async fn test_demo_hub_file() {
    let hub =
        SimulatedHub::from_json_file(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/hub.json"))
            .expect("Demo hub should load");
    let (mut supervisor, registry) = start(hub).await;

    let summary = supervisor.step().await.unwrap().expect("Pass should complete");
    assert_eq!(summary.modules, 2);

    let body = scrape(&registry).await;
    assert!(body.contains(r#"light{hardware_id="LIGHTMK3-00002.light",unit="lux"} 312"#));
    assert!(body.contains(r#"pressure{hardware_id="greenhouse-1.pressure",unit="mbar"} 1013.2"#));
}

#[tokio::test(start_paused = true)]
async fn test_file_hub_keeps_no_call_log() {
    let mut hub =
        SimulatedHub::from_json_file(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/hub.json"))
            .expect("Demo hub should load");
    hub.register_hub().await.unwrap();
    let registry = Arc::new(MetricsRegistry::new().unwrap());
    let mut collector = Collector::new(hub, registry.clone());

    for _ in 0..50 {
        collector.run_pass(false).await.unwrap();
    }

    assert_eq!(registry.passes(), 50);
    assert!(collector.session_mut().log().events().is_empty());
}
