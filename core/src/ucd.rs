//! IVOA Unified Content Descriptor validation.
//!
//! A UCD is a `;`-separated list of words from the UCD1+ controlled
//! vocabulary, e.g. `phys.energy;em.gamma`. Each word carries a usage flag:
//!
//! | Flag | Meaning                                   |
//! |------|-------------------------------------------|
//! | `P`  | primary only (must be the first word)     |
//! | `S`  | secondary only (never the first word)     |
//! | `Q`  | either position                           |
//! | `E`  | either position, electromagnetic spectrum |
//! | `C`  | either position, colour index             |
//! | `V`  | either position, vector component         |
//!
//! # Examples
//!
//! ```
//! use fits_schema_core::validate_ucd;
//!
//! assert!(validate_ucd("phys.energy").is_ok());
//! assert!(validate_ucd("phys.energy;em.gamma").is_ok());
//! assert!(validate_ucd("not-a-real-ucd").is_err());
//! assert!(validate_ucd("stat.error").is_err()); // secondary-only word first
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::validate::SchemaError;

/// Subset of the UCD1+ vocabulary: `<flag> <word>` per line.
const VOCABULARY: &str = "\
Q arith.diff
Q arith.factor
Q arith.grad
Q arith.rate
Q arith.ratio
Q arith.squared
Q arith.sum
Q arith.zp
E em.IR
E em.IR.J
E em.IR.H
E em.IR.K
E em.UV
E em.X-ray
E em.X-ray.soft
E em.X-ray.medium
E em.X-ray.hard
E em.bin
E em.energy
E em.freq
E em.gamma
E em.gamma.soft
E em.gamma.hard
E em.line
E em.mm
E em.opt
E em.opt.B
E em.opt.V
E em.opt.R
E em.radio
E em.wavenumber
E em.wl
E em.wl.central
E em.wl.effective
Q instr
Q instr.background
Q instr.bandpass
Q instr.bandwidth
Q instr.baseline
Q instr.beam
Q instr.calib
Q instr.det
Q instr.det.noise
Q instr.det.psf
Q instr.det.qe
Q instr.dispersion
Q instr.experiment
Q instr.filter
Q instr.fov
Q instr.obsty
Q instr.offset
Q instr.order
Q instr.param
Q instr.pixel
Q instr.plate
Q instr.precision
Q instr.rmsf
Q instr.saturation
Q instr.scale
Q instr.sensitivity
Q instr.setup
Q instr.skyLevel
Q instr.skyTemp
Q instr.tel
Q instr.tel.focalLength
P meta.abstract
P meta.bib
P meta.bib.author
P meta.bib.bibcode
P meta.bib.journal
P meta.bib.page
P meta.bib.volume
Q meta.calibLevel
Q meta.checksum
Q meta.code
Q meta.code.class
Q meta.code.error
Q meta.code.member
Q meta.code.mime
Q meta.code.multip
Q meta.code.qual
Q meta.code.status
P meta.cryptic
P meta.curation
Q meta.dataset
P meta.email
Q meta.file
Q meta.fits
Q meta.id
Q meta.id.assoc
Q meta.id.CoI
Q meta.id.cross
Q meta.id.parent
Q meta.id.part
Q meta.id.PI
S meta.main
S meta.modelled
P meta.note
P meta.number
Q meta.preview
Q meta.query
Q meta.record
Q meta.ref
Q meta.ref.doi
Q meta.ref.ivoid
Q meta.ref.uri
Q meta.ref.url
Q meta.software
Q meta.table
P meta.title
P meta.ucd
P meta.unit
P meta.version
Q obs
Q obs.airMass
Q obs.atmos
Q obs.atmos.extinction
Q obs.atmos.refractAngle
Q obs.calib
Q obs.calib.flat
Q obs.calib.dark
Q obs.exposure
Q obs.field
Q obs.image
Q obs.observer
Q obs.occult
Q obs.param
Q obs.proposal
Q obs.proposal.cycle
Q obs.sequence
Q phot.antennaTemp
Q phot.calib
Q phot.color
Q phot.count
Q phot.fluence
Q phot.flux
Q phot.flux.bol
Q phot.flux.density
Q phot.flux.density.sb
Q phot.flux.sb
Q phot.limbDark
Q phot.mag
Q phot.mag.bc
Q phot.mag.bol
Q phot.mag.distMod
Q phot.mag.sb
Q phot.radiance
Q phys.SFR
Q phys.absorption
Q phys.absorption.coeff
Q phys.abund
Q phys.angArea
Q phys.angMomentum
Q phys.angSize
Q phys.angSize.smajAxis
Q phys.angSize.sminAxis
Q phys.area
Q phys.atmol
Q phys.density
Q phys.dielectric
Q phys.distance
Q phys.dispMeasure
Q phys.electField
Q phys.electron
Q phys.energy
Q phys.energy.Gibbs
Q phys.energy.density
Q phys.entropy
Q phys.eqw
Q phys.excitParam
Q phys.gauntFactor
Q phys.gravity
Q phys.ionizParam
Q phys.luminosity
Q phys.luminosity.fun
Q phys.magAbs
Q phys.magField
Q phys.mass
Q phys.mass.loss
Q phys.mol
Q phys.optical
Q phys.particle
Q phys.particle.neutrino
Q phys.polarization
Q phys.polarization.circular
Q phys.polarization.linear
Q phys.pressure
Q phys.recombination.coeff
Q phys.refractIndex
Q phys.size
Q phys.size.axisRatio
Q phys.size.diameter
Q phys.size.radius
Q phys.size.smajAxis
Q phys.size.sminAxis
Q phys.temperature
Q phys.temperature.effective
Q phys.temperature.electron
Q phys.transmission
Q phys.veloc
Q phys.veloc.ang
Q phys.veloc.dispersion
Q phys.veloc.escape
Q phys.veloc.expansion
Q phys.veloc.microTurb
Q phys.veloc.orbital
Q phys.veloc.pulsat
Q phys.veloc.rotat
Q phys.veloc.transverse
Q phys.virial
Q phys.volume
Q pos
Q pos.angDistance
Q pos.angResolution
Q pos.az
Q pos.az.alt
Q pos.az.azi
Q pos.az.zd
Q pos.barycenter
Q pos.bodyrc
Q pos.bodyrc.alt
Q pos.bodyrc.lat
Q pos.bodyrc.lon
Q pos.cartesian
V pos.cartesian.x
V pos.cartesian.y
V pos.cartesian.z
Q pos.cmb
Q pos.dirCos
Q pos.distance
Q pos.earth
Q pos.earth.altitude
Q pos.earth.lat
Q pos.earth.lon
Q pos.ecliptic
Q pos.ecliptic.lat
Q pos.ecliptic.lon
Q pos.eop
Q pos.ephem
Q pos.eq
Q pos.eq.dec
Q pos.eq.ha
Q pos.eq.ra
Q pos.eq.spd
Q pos.errorEllipse
Q pos.frame
Q pos.galactic
Q pos.galactic.lat
Q pos.galactic.lon
Q pos.galactocentric
Q pos.geocentric
Q pos.healpix
Q pos.heliocentric
Q pos.HTM
Q pos.lambert
Q pos.lg
Q pos.lsr
Q pos.lunar
Q pos.lunar.occult
Q pos.nutation
Q pos.outline
Q pos.parallax
Q pos.parallax.dyn
Q pos.parallax.phot
Q pos.parallax.spect
Q pos.parallax.trig
Q pos.phaseAng
Q pos.pm
Q pos.posAng
Q pos.precess
Q pos.supergalactic
Q pos.supergalactic.lat
Q pos.supergalactic.lon
Q pos.wcs
Q pos.wcs.cdmatrix
Q pos.wcs.crpix
Q pos.wcs.crval
Q pos.wcs.ctype
Q pos.wcs.naxes
Q pos.wcs.naxis
Q pos.wcs.scale
Q spect
Q spect.binSize
Q spect.continuum
Q spect.dopplerParam
Q spect.dopplerVeloc
Q spect.index
Q spect.line
Q spect.line.asymmetry
Q spect.line.broad
Q spect.line.eqWidth
Q spect.line.intensity
Q spect.line.profile
Q spect.line.strength
Q spect.line.width
Q spect.resolution
Q src
Q src.calib
Q src.calib.guideStar
Q src.class
Q src.class.color
Q src.class.distance
Q src.class.luminosity
Q src.class.richness
Q src.class.starGalaxy
Q src.class.struct
Q src.density
Q src.ellipticity
Q src.impactParam
Q src.morph
Q src.morph.param
Q src.morph.scLength
Q src.morph.type
Q src.net
Q src.orbital
Q src.orbital.eccentricity
Q src.orbital.inclination
Q src.orbital.meanAnomaly
Q src.orbital.node
Q src.orbital.periastron
Q src.redshift
Q src.redshift.phot
Q src.sample
Q src.spType
Q src.var
Q src.var.amplitude
Q src.var.index
Q src.var.pulse
Q stat
Q stat.Fourier
Q stat.Fourier.amplitude
S stat.correlation
S stat.covariance
S stat.error
S stat.error.sys
S stat.filling
Q stat.fit
Q stat.fit.chi2
Q stat.fit.dof
Q stat.fit.goodness
Q stat.fit.omc
Q stat.fit.param
Q stat.fit.residual
Q stat.likelihood
S stat.max
S stat.mean
S stat.median
S stat.min
Q stat.param
Q stat.probability
S stat.rank
S stat.rms
Q stat.snr
S stat.stdev
S stat.uncalib
Q stat.value
Q stat.variance
Q stat.weight
Q time
Q time.age
Q time.creation
Q time.crossing
Q time.duration
Q time.end
Q time.epoch
Q time.equinox
Q time.interval
Q time.lifetime
Q time.period
Q time.period.revolution
Q time.period.rotation
Q time.phase
Q time.processing
Q time.publiYear
Q time.relax
Q time.release
Q time.resolution
Q time.scale
Q time.start";

/// How a vocabulary word may be positioned inside a UCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UcdUsage {
    /// Only valid as the first word.
    Primary,
    /// Never valid as the first word.
    Secondary,
    /// Valid anywhere.
    Either,
}

impl UcdUsage {
    fn from_flag(flag: &str) -> Self {
        match flag {
            "P" => Self::Primary,
            "S" => Self::Secondary,
            _ => Self::Either,
        }
    }
}

static WORDS: LazyLock<HashMap<String, UcdUsage>> = LazyLock::new(|| {
    VOCABULARY
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(flag, word)| (word.to_ascii_lowercase(), UcdUsage::from_flag(flag)))
        .collect()
});

/// Looks up the usage flag of a single vocabulary word (case-insensitive).
pub fn ucd_word_usage(word: &str) -> Option<UcdUsage> {
    WORDS.get(&word.to_ascii_lowercase()).copied()
}

/// Validates a UCD against the controlled vocabulary and returns it trimmed.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidUcd`] when a word is unknown, a
/// secondary-only word comes first, or a primary-only word comes later.
pub fn validate_ucd(raw: &str) -> Result<String, SchemaError> {
    let fail = |reason: String| SchemaError::InvalidUcd {
        ucd: raw.to_string(),
        reason,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(fail("empty UCD".to_string()));
    }

    let mut words = Vec::new();
    for (index, token) in trimmed.split(';').enumerate() {
        let token = token.trim();
        let word = token.strip_prefix("ivoa:").unwrap_or(token);
        let usage = ucd_word_usage(word).ok_or_else(|| fail(format!("unknown word '{word}'")))?;
        match (index, usage) {
            (0, UcdUsage::Secondary) => {
                return Err(fail(format!(
                    "secondary word '{word}' is not valid as a primary word"
                )));
            }
            (i, UcdUsage::Primary) if i > 0 => {
                return Err(fail(format!(
                    "primary word '{word}' is not valid as a secondary word"
                )));
            }
            _ => words.push(token),
        }
    }

    Ok(words.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_words() {
        assert_eq!(validate_ucd("phys.energy").unwrap(), "phys.energy");
        assert_eq!(validate_ucd(" time.epoch ").unwrap(), "time.epoch");
        assert!(validate_ucd("pos.eq.ra").is_ok());
    }

    #[test]
    fn test_compound_ucd() {
        assert!(validate_ucd("phys.energy;em.gamma").is_ok());
        assert!(validate_ucd("pos.eq.ra;meta.main").is_ok());
        assert!(validate_ucd("stat.error;phys.energy").is_err());
    }

    #[test]
    fn test_case_insensitive_and_namespace() {
        assert!(validate_ucd("PHYS.ENERGY").is_ok());
        assert!(validate_ucd("ivoa:phys.energy").is_ok());
        assert!(validate_ucd("em.x-ray").is_ok());
    }

    #[test]
    fn test_rejects_unknown_words() {
        for bad in ["not-a-real-ucd", "some-invalid-name", "phys.energies", "", "phys.energy;"] {
            assert!(
                matches!(validate_ucd(bad), Err(SchemaError::InvalidUcd { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_primary_word_cannot_follow() {
        let err = validate_ucd("phys.energy;meta.title").unwrap_err();
        assert!(err.to_string().contains("not valid as a secondary word"));
    }

    #[test]
    fn test_usage_lookup() {
        assert_eq!(ucd_word_usage("meta.main"), Some(UcdUsage::Secondary));
        assert_eq!(ucd_word_usage("meta.title"), Some(UcdUsage::Primary));
        assert_eq!(ucd_word_usage("phys.energy"), Some(UcdUsage::Either));
        assert_eq!(ucd_word_usage("nope"), None);
    }
}
