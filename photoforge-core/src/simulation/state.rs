use photoforge_schemas::{
    environment::{PH_BOUNDS, TEMPERATURE_BOUNDS},
    model::KineticSettings,
    scenario::ScenarioParameters,
};

/// The mutable state of one culture. It is moved into every step and the updated
/// state is handed back, so no step can observe another scenario's culture.
#[derive(Debug, Clone, PartialEq)]
pub struct CultureState {
    pub elapsed_hours: f64,
    /// g/L
    pub biomass: f64,
    /// cells/mL
    pub cell_concentration: f64,
    pub ph: f64,
    /// °C
    pub temperature: f64,
    /// g/L
    pub nutrients: f64,
    /// mg/L
    pub dissolved_oxygen: f64,
    pub co2_fraction: f64,
    /// Biomass produced since inoculation, g/L.
    pub cumulative_productivity: f64,
    /// Biomass recorded by the previous step, used for productivity.
    pub previous_biomass: f64,
}

impl CultureState {
    /// Builds the hour-0 state. `params` is expected to be normalized.
    pub fn initial(params: &ScenarioParameters, kinetics: &KineticSettings) -> Self {
        let biomass = params
            .initial_biomass
            .max(kinetics.min_viable_biomass.min(params.ki_biomass))
            .min(params.ki_biomass);

        Self {
            elapsed_hours: 0.0,
            biomass,
            cell_concentration: biomass * kinetics.cells_per_gram,
            ph: PH_BOUNDS.clamp(params.base_ph),
            temperature: TEMPERATURE_BOUNDS.clamp(params.base_temperature),
            nutrients: params.nutrient_level.max(kinetics.nutrient_floor),
            dissolved_oxygen: kinetics.oxygen_bounds.clamp(kinetics.initial_dissolved_oxygen),
            co2_fraction: kinetics.co2_bounds.clamp(kinetics.co2_supply_fraction),
            cumulative_productivity: 0.0,
            previous_biomass: biomass,
        }
    }
}
