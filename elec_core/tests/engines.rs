//! End-to-end checks of the engines through their public API.

use approx::assert_relative_eq;
use serde_json::json;

use elec_core::calculations::dpms::{self, LoadCategory};
use elec_core::calculations::loads_per_panel::{self, FeedType};
use elec_core::calculations::short_circuit::{self, ShortCircuitPoint};
use elec_core::calculations::thermal::{self, ThermalCheck};
use elec_core::calculations::voltage_drop::{self, VoltageDropCheck};
use elec_core::calculations::{calculate_record, CircuitLoad, Engine, PanelEnvironment};

fn living_room() -> PanelEnvironment {
    serde_json::from_value(json!({
        "id": "amb-1",
        "denominacionTablero": "TS1",
        "denominacionAmbiente": "Living",
        "dimensiones": { "x": 10.0, "y": 10.0 },
        "gradoElectrificacion": "Medio",
        "cargas": {
            "TUG": [{ "cantidadBocas": 5, "dpms": 0 }, { "cantidadBocas": 5, "dpms": 0 }]
        }
    }))
    .unwrap()
}

#[test]
fn test_dpms_living_room() {
    let result = dpms::calculate(&living_room()).unwrap();

    let tug = &result.by_category[&LoadCategory::Tug];
    assert_relative_eq!(tug.installed_power_va, 1800.0);
    assert_relative_eq!(tug.dpms_va, 1350.0);
    assert_relative_eq!(result.dpms_total_va, 1350.0);
    assert_relative_eq!(result.current_total_a, 1350.0 / 220.0, epsilon = 1e-12);
    assert_relative_eq!(result.current_total_a, 6.136, epsilon = 1e-3);
    assert_relative_eq!(result.area_m2, 100.0);
    assert_relative_eq!(result.power_density_va_m2, 13.5);
}

#[test]
fn test_dpms_totals_are_category_sums() {
    let mut room = living_room();
    room.grade = Some("Superior".to_string());
    room.loads
        .insert(LoadCategory::Iug, vec![dpms::LoadItem::outlets(6)]);
    room.loads
        .insert(LoadCategory::Ate, vec![dpms::LoadItem::declared(2500.0)]);

    let result = dpms::calculate(&room).unwrap();
    let dpms_sum: f64 = result.by_category.values().map(|c| c.dpms_va).sum();
    let current_sum: f64 = result.by_category.values().map(|c| c.current_a).sum();

    assert_relative_eq!(result.dpms_total_va, dpms_sum, epsilon = 1e-9);
    assert_relative_eq!(result.current_total_a, current_sum, epsilon = 1e-9);
    assert_relative_eq!(result.power_density_va_m2, result.dpms_total_va / 100.0, epsilon = 1e-9);
}

#[test]
fn test_dpms_zero_area_density() {
    let mut room = living_room();
    room.dimensions.x = 0.0;
    let result = dpms::calculate(&room).unwrap();
    assert_relative_eq!(result.power_density_va_m2, 0.0);
    assert_relative_eq!(result.dpms_total_va, 1350.0);
}

#[test]
fn test_loads_per_panel_currents() {
    for feed in FeedType::ALL {
        let load = CircuitLoad {
            id: format!("c-{:?}", feed),
            panel_id: "TG".to_string(),
            line_id: "L1".to_string(),
            class: Default::default(),
            feed,
            apparent_power_kva: 10.0,
            cos_phi: 0.9,
        };
        let result = loads_per_panel::calculate(&load).unwrap();
        let expected = match feed {
            FeedType::RST | FeedType::RSTN => 10_000.0 / (3f64.sqrt() * 380.0),
            FeedType::RN | FeedType::SN | FeedType::TN => 10_000.0 / 220.0,
            FeedType::RS | FeedType::ST | FeedType::RT => 10_000.0 / 380.0,
        };
        assert_relative_eq!(result.nominal_current_a, expected, epsilon = 1e-9);
    }
}

#[test]
fn test_panels_roll_up() {
    let records = json!([
        {"id": "1", "identificacionTablero": "TG", "lineaOCarga": "Bombas", "alimentacion": "RSTN", "potenciaAparente": 15.0, "cosPhi": 0.85},
        {"id": "2", "identificacionTablero": "TS1", "lineaOCarga": "Tomas", "potenciaAparente": 3.0},
        {"id": "3", "identificacionTablero": "TG", "lineaOCarga": "Ascensor", "alimentacion": "RST", "potenciaAparente": 10.0, "tipoCarga": "Emergencia"}
    ]);
    let loads: Vec<CircuitLoad> = serde_json::from_value(records).unwrap();
    let results = loads_per_panel::calculate_multiple(&loads).unwrap();
    let summary = loads_per_panel::all_panels_summary(&results);

    assert_eq!(summary.panel_count, 2);
    assert_eq!(summary.panels[0].panel_id, "TG");
    assert_eq!(summary.panels[0].load_count, 2);
    assert_relative_eq!(summary.apparent_power_kva, 28.0, epsilon = 1e-9);
    assert_relative_eq!(
        summary.overall_cos_phi,
        summary.active_power_kw / summary.apparent_power_kva,
        epsilon = 1e-12
    );
}

#[test]
fn test_thermal_monotonic_in_ambient() {
    let mut previous = f64::INFINITY;
    let mut ambient = 30.0;
    while ambient <= 60.0 {
        let check = ThermalCheck {
            id: "t".to_string(),
            circuit: String::new(),
            design_current_a: 20.0,
            section_mm2: 6.0,
            ambient_temperature_c: ambient,
            conductor_count: 3,
        };
        let result = thermal::calculate(&check).unwrap();
        assert!(result.corrected_ampacity_a <= previous);
        assert_eq!(result.passes, result.design_current_a <= result.max_permitted_current_a);
        previous = result.corrected_ampacity_a;
        ambient += 2.5;
    }
}

#[test]
fn test_thermal_suggestion_passes_with_margin() {
    let suggestion = thermal::suggest_optimal_section(30.0, 40.0, 3).unwrap();
    let check = ThermalCheck {
        id: "t".to_string(),
        circuit: String::new(),
        design_current_a: 30.0,
        section_mm2: suggestion.section_mm2,
        ambient_temperature_c: 40.0,
        conductor_count: 3,
    };
    let result = thermal::calculate(&check).unwrap();
    assert!(result.passes);
    assert!(result.utilization_pct <= 80.0);
}

#[test]
fn test_voltage_drop_reference_run() {
    let check = VoltageDropCheck::new("vd-1", 20.0, 50.0, 4.0);
    let result = voltage_drop::calculate(&check).unwrap();

    // ρ(1+α(T−20))/S per km, scaled by L/1000
    let expected_r = 0.01724 * (1.0 + 0.00393 * 50.0) / 4.0 * 50.0 / 1000.0;
    assert_relative_eq!(result.resistance_ohm, expected_r, epsilon = 1e-12);
    assert_relative_eq!(result.reactance_ohm, 0.0035, epsilon = 1e-12);
    assert_relative_eq!(result.drop_v, 0.070190, epsilon = 1e-3);
    assert!(result.passes);
}

#[test]
fn test_voltage_drop_round_trip() {
    for (current, length, section) in [(20.0, 50.0, 4.0), (150.0, 300.0, 16.0), (400.0, 300.0, 95.0), (0.0, 10.0, 2.5)] {
        let result = voltage_drop::calculate(&VoltageDropCheck::new("vd", current, length, section)).unwrap();
        assert_relative_eq!(
            result.consumption_voltage_v + result.drop_v,
            result.nominal_voltage_v,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_transformer_impedance() {
    let point = ShortCircuitPoint::new("cc-1");
    assert_relative_eq!(point.transformer_impedance(), 0.05 * 380.0 * 380.0 / 630_000.0, epsilon = 1e-15);

    let result = short_circuit::calculate(&point).unwrap();
    assert_relative_eq!(result.transformer_impedance_ohm, 0.011460, epsilon = 1e-6);
    assert_relative_eq!(result.source_impedance_ohm, 0.1444, epsilon = 1e-9);
    assert_relative_eq!(result.initial_current_a, 1548.1, epsilon = 0.1);
}

#[test]
fn test_peak_never_below_initial() {
    let mut point = ShortCircuitPoint::new("cc");
    for (length, section) in [(0.0, 240.0), (5.0, 240.0), (100.0, 2.5), (500.0, 1.5), (50.0, 95.0)] {
        point.cable_length_m = length;
        point.cable_section_mm2 = section;
        let result = short_circuit::calculate(&point).unwrap();
        assert!(result.peak_current_a >= result.initial_current_a);
    }
}

#[test]
fn test_record_dispatch_matches_typed_call() {
    let record = json!({"id": "vd-1", "corriente": 20.0, "longitud": 50.0, "seccion": 4.0});
    let untyped = calculate_record(Engine::VoltageDrop, &record).unwrap();
    let typed = voltage_drop::calculate(&VoltageDropCheck::new("vd-1", 20.0, 50.0, 4.0)).unwrap();

    assert_eq!(untyped, serde_json::to_value(typed).unwrap());
    assert_eq!(untyped["nivel"], "EXCELENTE");
}
