/// Values used when neither the batch file nor the command line sets them.
pub struct DefaultsConfig {
    pub height: f64,
    pub vacancy_height: f64,
    pub rotation: f64,
    pub layer: isize,
    pub freeze_bottom_layers: usize,
    pub kpoint_density: f64,
    pub vacuum: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            height: 1.5,
            vacancy_height: 0.5,
            rotation: 0.0,
            layer: -1,
            freeze_bottom_layers: 0,
            kpoint_density: 1000.0,
            vacuum: 5.0,
        }
    }
}
