use crate::entities::{Bin, Instance};
use crate::io::ext_repr::{ExtBin, ExtSolution};
use crate::packing::Packer;
use crate::resources::Demand;

/// Exports the bins of a packing run out of the library
pub fn export<D: Demand>(packer: &Packer<D>, lower_bound: Option<usize>) -> ExtSolution {
    ExtSolution {
        instance: packer.instance.name.clone(),
        algorithm: packer.label().to_string(),
        n_bins: packer.n_bins(),
        lower_bound,
        bins: packer
            .bins()
            .iter()
            .map(|bin| export_bin(bin, packer.instance))
            .collect(),
    }
}

pub fn export_bin<D: Demand>(bin: &Bin<D>, instance: &Instance<D>) -> ExtBin {
    ExtBin {
        id: bin.id,
        allocation: bin
            .alloc_map
            .iter()
            .map(|(app_id, replicas)| (instance.app(*app_id).id.clone(), replicas.clone()))
            .collect(),
    }
}
