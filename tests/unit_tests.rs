use yocto_exporter::{
    error::ExporterError, FunctionKind, FunctionReading, MetricsRegistry, RegistrationError,
    SensorGauge, SessionFault, SimulatedHub, WebConfig,
};

/// Test the fixed metric catalog: names, units and hardware_id suffixes
#[test]
fn test_metric_catalog() {
    let expected = [
        (SensorGauge::UsbCurrent, "usb_current", "mA", "current"),
        (SensorGauge::Luminosity, "luminosity", "%", "luminosity"),
        (SensorGauge::Pressure, "pressure", "mbar", "pressure"),
        (SensorGauge::Temperature, "temperature", "Celsius", "temperature"),
        (SensorGauge::Humidity, "humidity", "% RH", "humidity"),
        (SensorGauge::Light, "light", "lux", "light"),
        (SensorGauge::Co2, "co2", "ppm", "co2"),
    ];

    for (gauge, name, unit, suffix) in expected {
        assert_eq!(gauge.name(), name);
        assert_eq!(gauge.unit(), unit);
        assert_eq!(gauge.suffix(), suffix);
    }
    assert_eq!(SensorGauge::ALL.len(), expected.len());
}

/// Test that only the five sensor kinds map to gauges
#[test]
fn test_recognized_function_kinds() {
    let recognized = [
        FunctionKind::Temperature,
        FunctionKind::Pressure,
        FunctionKind::Humidity,
        FunctionKind::LightSensor,
        FunctionKind::CarbonDioxide,
    ];
    for kind in &recognized {
        assert!(SensorGauge::for_function(kind).is_some(), "{} should map", kind);
    }

    for name in ["DataLogger", "Voltage", "Relay", "GenericSensor", ""] {
        let kind = FunctionKind::from_type_name(name);
        assert!(SensorGauge::for_function(&kind).is_none(), "{} should not map", name);
    }
}

/// Test every gauge renders with its own unit label
#[test]
fn test_registry_exposes_units() {
    let registry = MetricsRegistry::new().expect("Should create registry");
    for gauge in SensorGauge::ALL {
        registry.set_gauge(gauge, &gauge.hardware_id("rack"), 1.0);
    }

    let output = registry.encode().expect("Should encode");
    for gauge in SensorGauge::ALL {
        let line = format!(
            r#"{}{{hardware_id="{}",unit="{}"}} 1"#,
            gauge.name(),
            gauge.hardware_id("rack"),
            gauge.unit()
        );
        assert!(output.contains(&line), "missing {}", line);
    }
    assert_eq!(registry.hardware_ids().len(), SensorGauge::ALL.len());
}

/// Test advertised values that are not numbers
#[test]
fn test_function_reading_values() {
    let cases = [
        ("21.5", Some(21.5)),
        (" 55 ", Some(55.0)),
        ("", None),
        ("OFF", None),
        ("inf", None),
    ];
    for (raw, expected) in cases {
        let reading = FunctionReading::new(FunctionKind::Temperature, "temperature", raw);
        assert_eq!(reading.numeric_value(), expected, "value {:?}", raw);
    }
}

/// Test ExporterError creation and classification
#[test]
fn test_exporter_error_types() {
    let fault: ExporterError = SessionFault::new("usb unplugged").into();
    assert!(fault.to_string().contains("usb unplugged"));
    assert!(matches!(fault, ExporterError::Session(_)));

    let registration: ExporterError = RegistrationError::new("usb", "no device").into();
    assert_eq!(registration.to_string(), "RegisterHub error on usb: no device");
    assert!(matches!(registration, ExporterError::Registration(_)));

    let web_error = ExporterError::web_server_error("Server startup failed");
    assert!(format!("{}", web_error).contains("Server startup failed"));

    let config_error = ExporterError::config_error("Invalid configuration");
    assert!(format!("{}", config_error).contains("Invalid configuration"));
}

/// Test WebConfig builder pattern
#[test]
fn test_web_config() {
    let config = WebConfig::default()
        .with_host("127.0.0.1")
        .with_port(9090)
        .with_metrics_path("/yocto");

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 9090);
    assert_eq!(config.metrics_path, "/yocto");
    assert_eq!(config.bind_address(), "127.0.0.1:9090");

    let default = WebConfig::default();
    assert_eq!(default.bind_address(), "0.0.0.0:8000");
    assert_eq!(default.metrics_path, "/metrics");
}

/// Test loading a simulated hub from disk
#[test]
fn test_simulated_hub_from_file() {
    let path = std::env::temp_dir().join(format!("yocto_exporter_hub_{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"modules": [{"serial_number": "METEOMK1-00001", "functions": []}]}"#,
    )
    .expect("Should write hub file");

    let hub = SimulatedHub::from_json_file(&path);
    std::fs::remove_file(&path).ok();
    tokio_test::assert_ok!(hub);

    let missing = SimulatedHub::from_json_file("/nonexistent/yocto_exporter_hub.json");
    assert!(matches!(missing, Err(ExporterError::Io(_))));
}
