use std::collections::HashMap;

/// Tabla estática de avisos: nombre de clase -> mensaje legible.
/// Se construye una vez en el arranque y es de solo lectura durante
/// toda la vida del proceso.
#[derive(Debug, Clone)]
pub struct AdvisoryTable {
    map: HashMap<String, String>,
}

impl AdvisoryTable {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Aviso para una clase. Si la clase no tiene mensaje asociado,
    /// el aviso es el propio nombre de la clase (fallback, no error).
    pub fn advice(&self, class_name: &str) -> String {
        self.map
            .get(class_name)
            .cloned()
            .unwrap_or_else(|| class_name.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl Default for AdvisoryTable {
    /// Mensajes para las señales de tráfico que el modelo conoce.
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("Green Light".to_string(), "Be ready to go".to_string());
        map.insert("Red Light".to_string(), "Stop".to_string());
        map.insert("Stop".to_string(), "Be ready to stop".to_string());
        for kmh in (10..=120).step_by(10) {
            map.insert(
                format!("Speed Limit {}", kmh),
                format!("Minimize your speed to {} kilometers per hour", kmh),
            );
        }
        Self::new(map)
    }
}
