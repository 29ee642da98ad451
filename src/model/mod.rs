use std::collections::HashMap;

use uuid::Uuid;

use crate::curve::NurbsCurve;
use crate::misc::FloatingPoint;

/// A curve owned by a table, with its identity and display name
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveEntry<T: FloatingPoint> {
    id: Uuid,
    name: String,
    curve: NurbsCurve<T>,
}

impl<T: FloatingPoint> CurveEntry<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curve(&self) -> &NurbsCurve<T> {
        &self.curve
    }

    pub fn curve_mut(&mut self) -> &mut NurbsCurve<T> {
        &mut self.curve
    }
}

/// Ordered curve storage with lookups by position, id and name
/// # Example
/// ```
/// use nurbs_kernel::prelude::*;
///
/// let mut table = CurveTable::default();
/// let curve = NurbsCurve::<f64>::try_create(3, false, 2, 2).unwrap();
/// let id = table.add("rail", curve.clone());
/// assert_eq!(table.find_by_id(&id).map(|e| e.curve()), Some(&curve));
/// assert_eq!(table.find_by_name("rail").len(), 1);
/// assert!(table.remove(&id).is_some());
/// assert!(table.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CurveTable<T: FloatingPoint> {
    entries: Vec<CurveEntry<T>>,
    id_index: HashMap<Uuid, usize>,
}

impl<T: FloatingPoint> CurveTable<T> {
    pub fn new() -> Self {
        Self {
            entries: vec![],
            id_index: HashMap::new(),
        }
    }

    /// Take ownership of a curve under a fresh id
    pub fn add(&mut self, name: impl Into<String>, curve: NurbsCurve<T>) -> Uuid {
        let id = Uuid::new_v4();
        self.id_index.insert(id, self.entries.len());
        self.entries.push(CurveEntry {
            id,
            name: name.into(),
            curve,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_index(&self, index: usize) -> Option<&CurveEntry<T>> {
        self.entries.get(index)
    }

    pub fn find_by_id(&self, id: &Uuid) -> Option<&CurveEntry<T>> {
        self.id_index.get(id).map(|i| &self.entries[*i])
    }

    pub fn find_by_id_mut(&mut self, id: &Uuid) -> Option<&mut CurveEntry<T>> {
        self.id_index.get(id).map(|i| &mut self.entries[*i])
    }

    /// Entries with the given name, in insertion order
    pub fn find_by_name(&self, name: &str) -> Vec<&CurveEntry<T>> {
        self.entries.iter().filter(|e| e.name == name).collect()
    }

    /// Give up ownership of a curve
    pub fn remove(&mut self, id: &Uuid) -> Option<NurbsCurve<T>> {
        let index = self.id_index.remove(id)?;
        let entry = self.entries.remove(index);
        for e in self.entries[index..].iter() {
            if let Some(i) = self.id_index.get_mut(&e.id) {
                *i -= 1;
            }
        }
        Some(entry.curve)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CurveEntry<T>> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;

    use super::*;

    #[test]
    fn lookups_follow_removal() {
        let mut table = CurveTable::new();
        let line = |x: f64| {
            NurbsCurve::try_clamped_uniform(2, 2, &[dvector![x, 0.], dvector![x, 1.]], 1.).unwrap()
        };
        let a = table.add("a", line(0.));
        let b = table.add("b", line(1.));
        let c = table.add("b", line(2.));
        assert_eq!(table.len(), 3);
        assert_eq!(table.find_by_name("b").len(), 2);

        assert_eq!(table.remove(&a), Some(line(0.)));
        assert!(table.remove(&a).is_none());
        assert_eq!(table.find_by_index(0).map(|e| e.id()), Some(b));
        assert_eq!(table.find_by_id(&c).map(|e| e.curve()), Some(&line(2.)));

        table
            .find_by_id_mut(&b)
            .unwrap()
            .curve_mut()
            .set_cv(0, &dvector![5., 5.])
            .unwrap();
        assert_eq!(table.iter().next().unwrap().curve().cv(0).unwrap(), dvector![5., 5.]);
    }
}
